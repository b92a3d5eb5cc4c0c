use crate::request::SummaryStats;

pub const STAT_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatSlot {
    InputWords,
    OutputWords,
    Elapsed,
}

impl StatSlot {
    pub const ALL: [StatSlot; 3] = [
        StatSlot::InputWords,
        StatSlot::OutputWords,
        StatSlot::Elapsed,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            Self::InputWords => "stat-input-words",
            Self::OutputWords => "stat-output-words",
            Self::Elapsed => "stat-elapsed",
        }
    }
}

/// Output surface of the page: status line, trigger button, preview pane and stats.
pub trait View {
    fn status(&self) -> String;
    fn set_status(&self, text: &str);
    fn set_trigger_enabled(&self, enabled: bool);
    fn show_progress(&self);
    /// `html` is pre-rendered markup from the server.
    fn show_preview(&self, html: &str);
    /// Plain text, never interpreted as markup.
    fn show_error(&self, message: &str);
    fn set_stat(&self, slot: StatSlot, text: &str);
}

pub fn stat_texts(stats: &SummaryStats) -> [(StatSlot, String); 3] {
    [
        (StatSlot::InputWords, format_words(stats.input_words)),
        (StatSlot::OutputWords, format_words(stats.output_words)),
        (StatSlot::Elapsed, format_elapsed(stats.elapsed_seconds)),
    ]
}

pub fn format_words(count: f64) -> String {
    if !count.is_finite() || count < 0.0 {
        return STAT_PLACEHOLDER.to_string();
    }
    let digits = (count.round() as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_elapsed(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return STAT_PLACEHOLDER.to_string();
    }
    if seconds < 60.0 {
        return format!("{seconds:.1}s");
    }
    let whole = seconds.round() as u64;
    format!("{}m {:02}s", whole / 60, whole % 60)
}
