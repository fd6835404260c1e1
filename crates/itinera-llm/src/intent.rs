//! Few-shot intent classification prompt

/// Labels the classifier prompt asks for.
pub const INTENT_LABELS: &[&str] = &["plan_day", "refine_plan", "compare_options"];

const FEW_SHOT: &[(&str, &str)] = &[
    (
        "Plan 10:00-18:00 in Kyoto on 2025-12-12. Prefer temples and walkable.",
        "plan_day",
    ),
    (
        "Refine: add a specialty coffee stop near the second venue.",
        "refine_plan",
    ),
    (
        "Compare two options if it rains after 3pm.",
        "compare_options",
    ),
];

/// Build the classifier prompt for `user_input`.
pub fn intent_prompt(user_input: &str) -> String {
    let mut prompt = String::from(
        "You are an intent classifier for a travel planner.\n\
         Read the user's request and answer with exactly one of these labels: ",
    );
    prompt.push_str(
        &INTENT_LABELS
            .iter()
            .map(|l| format!("\"{}\"", l))
            .collect::<Vec<_>>()
            .join(", "),
    );
    prompt.push_str("\n\n");

    for (request, label) in FEW_SHOT {
        prompt.push_str(&format!(
            "User Request: \"{}\"\nClassification: \"{}\"\n\n",
            request, label
        ));
    }

    prompt.push_str(&format!(
        "User Request: \"{}\"\nClassification: ",
        user_input
    ));
    prompt
}
