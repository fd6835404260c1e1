//! Prompt builders for the draft and narration passes

use itinera_core::{DraftItinerary, PlanRequest, DRAFT_STOP_TARGET};

use crate::context::PlanContext;

/// Pass 1: select venues and propose start times, as schema-bound JSON.
pub fn draft_prompt(request: &PlanRequest, context: &PlanContext) -> String {
    format!(
        "You are an expert itinerary generator. Based on the data below, select {stops} locations \
from the VENUE LIST and propose a start time for each.
Your sole output MUST be a JSON object matching the requested schema. Do NOT include any commentary.

DATA: City: {city}, Date: {date}, Preferences: {preferences}
Weather Summary: {weather}
Air Quality Summary: {air}
VENUE LIST:
{venues}
",
        stops = DRAFT_STOP_TARGET,
        city = request.city,
        date = request.date,
        preferences = request.preferences.join(", "),
        weather = context.weather,
        air = context.air_quality,
        venues = context.venue_list(),
    )
}

/// Pass 3: narrate the final itinerary from the draft and travel data.
pub fn final_prompt(context: &PlanContext, route_summary: &str, draft: &DraftItinerary) -> String {
    format!(
        "You are the final narrative copilot. Your task is to turn the structured draft and travel \
data into a professional, easy-to-read, minute-by-minute itinerary.

**INSTRUCTIONS**
1. **Formatting**: Output ONLY the final Markdown itinerary.
2. **Trace**: Do NOT include the TRACE or INSTRUCTION blocks in the final output.
3. **Check**: Incorporate the WEATHER, AIR QUALITY, and TRAVEL TIMES into the narrative.

**CONTEXT**
- Weather: {weather}
- Air Quality: {air}
- Travel Summary (Use this for travel estimates): {route}

**DRAFT ITINERARY (Structured Data)**
{draft}
",
        weather = context.weather,
        air = context.air_quality,
        route = route_summary,
        draft = draft.to_prompt_json(),
    )
}
