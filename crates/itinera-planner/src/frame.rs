//! Output frames of a plan stream
//!
//! Wire shape, in order:
//!
//! ```text
//! data: [TRACE] Intent: plan_day
//! data: [TRACE] Geocoded: Kyoto, Japan
//! data: [TRACE] Weather Status: Max Temp: 11.2°C (Precip Prob: 20%)
//! data: [TRACE] Route Status: Travel distance: 7.4 km, Duration: 21.0 min.
//!
//! data: <token>
//! data: <token>
//! data: [END]
//!
//! ```

/// Marker carried by the terminator frame.
pub const END_MARKER: &str = "[END]";

/// Diagnostic summary emitted ahead of the narrated tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSummary {
    pub intent: String,
    pub geocoded: String,
    pub weather: String,
    pub route: String,
}

impl TraceSummary {
    /// `(label, value)` pairs in emission order.
    pub fn lines(&self) -> [(&'static str, &str); 4] {
        [
            ("Intent", self.intent.as_str()),
            ("Geocoded", self.geocoded.as_str()),
            ("Weather Status", self.weather.as_str()),
            ("Route Status", self.route.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Trace(TraceSummary),
    Token(String),
    End,
}

impl Frame {
    /// Encode as `text/event-stream` lines.
    pub fn encode(&self) -> String {
        match self {
            Frame::Trace(summary) => {
                let mut out = String::new();
                for (label, value) in summary.lines() {
                    for line in value.split('\n') {
                        out.push_str(&format!("data: [TRACE] {}: {}\n", label, line));
                    }
                }
                out.push('\n');
                out
            }
            // one data line per token line keeps multi-line tokens well formed
            Frame::Token(token) => token
                .split('\n')
                .map(|line| format!("data: {}\n", line.trim_end_matches('\r')))
                .collect(),
            Frame::End => format!("data: {}\n\n", END_MARKER),
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Frame::End)
    }
}
