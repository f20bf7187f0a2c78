// Copyright (c) The nextest Contributors
// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::ValueEnum;
use owo_colors::{OwoColorize, Style, style};
use std::{env::VarError, fmt};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log target for lines printed without an `info:`/`error:` heading.
pub(crate) const NO_HEADING: &str = "gotest_rerun_failed::no_heading";

/// Environment variable controlling colored output.
pub(crate) const COLOR_ENV: &str = "GOTEST_RERUN_COLOR";

/// Environment variable controlling the log filter.
pub(crate) const LOG_ENV: &str = "GOTEST_RERUN_LOG";

pub(crate) mod clap_styles {
    use clap::builder::{
        Styles,
        styling::{AnsiColor, Effects, Style},
    };

    const HEADER: Style = AnsiColor::Green.on_default().effects(Effects::BOLD);
    const USAGE: Style = AnsiColor::Green.on_default().effects(Effects::BOLD);
    const LITERAL: Style = AnsiColor::Cyan.on_default().effects(Effects::BOLD);
    const PLACEHOLDER: Style = AnsiColor::Cyan.on_default();
    const ERROR: Style = AnsiColor::Red.on_default().effects(Effects::BOLD);
    const VALID: Style = AnsiColor::Cyan.on_default().effects(Effects::BOLD);
    const INVALID: Style = AnsiColor::Yellow.on_default().effects(Effects::BOLD);

    pub(crate) const fn style() -> Styles {
        Styles::styled()
            .header(HEADER)
            .usage(USAGE)
            .literal(LITERAL)
            .placeholder(PLACEHOLDER)
            .error(ERROR)
            .valid(VALID)
            .invalid(INVALID)
    }
}

/// Output settings for the process.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub(crate) color: Color,
}

impl OutputContext {
    /// Reads output settings from the environment and installs the logger.
    ///
    /// Invalid settings fall back to their defaults with a warning.
    pub fn init_from_env() -> Self {
        let (color, invalid_color) = match std::env::var(COLOR_ENV) {
            Ok(value) => match Color::from_str(&value, true) {
                Ok(color) => (color, None),
                Err(_) => (Color::Auto, Some(value)),
            },
            Err(VarError::NotPresent) => (Color::Auto, None),
            Err(VarError::NotUnicode(value)) => {
                (Color::Auto, Some(value.to_string_lossy().into_owned()))
            }
        };

        let invalid_filter = color.init();

        if let Some(value) = invalid_color {
            tracing::warn!(
                "ignoring invalid {COLOR_ENV} value `{value}` (expected auto, always or never)"
            );
        }
        if let Some((value, error)) = invalid_filter {
            tracing::warn!("ignoring invalid {LOG_ENV} value `{value}`: {error}");
        }

        Self { color }
    }

    /// Returns general stderr styles for the current output context.
    pub fn stderr_styles(&self) -> StderrStyles {
        let mut styles = StderrStyles::default();

        if self.color.should_colorize(supports_color::Stream::Stderr) {
            styles.colorize();
        }

        styles
    }
}

/// When to produce colored output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

struct SimpleFormatter {
    styles: LogStyles,
}

impl<S, N> FormatEvent<S, N> for SimpleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        if metadata.target() != NO_HEADING {
            match *metadata.level() {
                Level::ERROR => {
                    write!(writer, "{}: ", "error".style(self.styles.error))?;
                }
                Level::WARN => {
                    write!(writer, "{}: ", "warning".style(self.styles.warning))?;
                }
                Level::INFO => {
                    write!(writer, "{}: ", "info".style(self.styles.info))?;
                }
                Level::DEBUG => {
                    write!(writer, "{}: ", "debug".style(self.styles.debug))?;
                }
                Level::TRACE => {
                    write!(writer, "{}: ", "trace".style(self.styles.trace))?;
                }
            }
        }

        let mut visitor = MessageVisitor {
            writer: &mut writer,
            error: None,
        };

        event.record(&mut visitor);

        if let Some(error) = visitor.error {
            return Err(error);
        }

        writeln!(writer)
    }
}

static MESSAGE_FIELD: &str = "message";

struct MessageVisitor<'writer, 'a> {
    writer: &'a mut format::Writer<'writer>,
    error: Option<fmt::Error>,
}

impl Visit for MessageVisitor<'_, '_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            if let Err(error) = write!(self.writer, "{value:?}") {
                self.error = Some(error);
            }
        }
    }
}

impl Color {
    /// Installs the logger. Returns the log filter from the environment if it couldn't be parsed.
    pub(crate) fn init(self) -> Option<(String, String)> {
        let mut log_styles = LogStyles::default();
        if self.should_colorize(supports_color::Stream::Stderr) {
            log_styles.colorize();
        }

        let mut invalid_filter = None;
        INIT_LOGGER.call_once(|| {
            let default_targets = Targets::new().with_default(LevelFilter::INFO);
            let targets = match std::env::var(LOG_ENV) {
                Ok(level_str) if !level_str.is_empty() => match level_str.parse::<Targets>() {
                    Ok(targets) => targets,
                    Err(error) => {
                        invalid_filter = Some((level_str, error.to_string()));
                        default_targets
                    }
                },
                Ok(_) | Err(VarError::NotPresent) => default_targets,
                Err(VarError::NotUnicode(value)) => {
                    invalid_filter = Some((
                        value.to_string_lossy().into_owned(),
                        "not valid UTF-8".to_owned(),
                    ));
                    default_targets
                }
            };

            let layer = tracing_subscriber::fmt::layer()
                .event_format(SimpleFormatter { styles: log_styles })
                .with_writer(std::io::stderr)
                .with_filter(targets);

            tracing_subscriber::registry().with(layer).init();
        });

        invalid_filter
    }

    pub(crate) fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

#[derive(Debug, Default)]
struct LogStyles {
    error: Style,
    warning: Style,
    info: Style,
    debug: Style,
    trace: Style,
}

impl LogStyles {
    fn colorize(&mut self) {
        self.error = style().red().bold();
        self.warning = style().yellow().bold();
        self.info = style().bold();
        self.debug = style().bold();
        self.trace = style().dimmed();
    }
}

/// Styles for messages written to stderr.
#[derive(Debug, Default)]
pub struct StderrStyles {
    pub(crate) bold: Style,
    pub(crate) colorize_help: bool,
}

impl StderrStyles {
    fn colorize(&mut self) {
        self.bold = style().bold();
        self.colorize_help = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("auto", Color::Auto; "auto")]
    #[test_case("always", Color::Always; "always")]
    #[test_case("NEVER", Color::Never; "uppercase")]
    fn color_from_str(input: &str, expected: Color) {
        assert_eq!(Color::from_str(input, true), Ok(expected));
    }

    #[test]
    fn color_from_str_invalid() {
        Color::from_str("sometimes", true).expect_err("unknown color is rejected");
    }

    #[test]
    fn styles_without_color() {
        let output = OutputContext {
            color: Color::Never,
        };
        let styles = output.stderr_styles();
        assert!(!styles.colorize_help);
    }
}
