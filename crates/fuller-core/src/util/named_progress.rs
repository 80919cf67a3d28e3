use indicatif::ProgressStyle;

const LABEL_WIDTH: usize = 32;

/// Extension trait for creating named progress bars.
pub trait NamedProgress {
    /// Creates a progress bar style with a name label.
    ///
    /// # Arguments
    ///
    /// * `name` - Label to display with the progress bar
    fn named_bar(name: &str) -> Self;
}

impl NamedProgress for ProgressStyle {
    fn named_bar(name: &str) -> Self {
        let fmt = format!(
            "{:<width$}{{wide_bar:40.cyan/blue}} {{pos:>4}}/{{len:<4}} [{{elapsed_precise}}] {{msg}}",
            name,
            width = LABEL_WIDTH - 1
        );
        ProgressStyle::default_bar()
            .template(&fmt)
            .unwrap_or(ProgressStyle::default_bar())
    }
}
