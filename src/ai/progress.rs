//! Provider dispatch with a background progress ticker
//!
//! The provider call blocks for minutes on large codebases. While it runs, a
//! scoped ticker thread prints a status line every interval. The only state
//! the two share is a one-shot stop channel; the ticker is always signalled
//! and joined before [`dispatch`] returns, on success, error and unwind.

use crate::ai::{AiResult, GenerationParams, LlmProvider, RUBRIC_CATEGORIES};
use crate::models::AnalysisRequest;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TickerConfig {
    pub interval: Duration,
    /// Skip the ticker entirely (no status lines)
    pub quiet: bool,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            quiet: false,
        }
    }
}

/// `MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Send the request through `provider`, printing progress to stdout
pub fn dispatch(
    provider: &dyn LlmProvider,
    request: &AnalysisRequest,
    ticker: &TickerConfig,
) -> AiResult<String> {
    dispatch_with_output(provider, request, ticker, std::io::stdout())
}

pub(crate) fn dispatch_with_output<W: Write + Send>(
    provider: &dyn LlmProvider,
    request: &AnalysisRequest,
    ticker: &TickerConfig,
    out: W,
) -> AiResult<String> {
    let params = GenerationParams::from(request);
    debug!(
        provider = provider.name(),
        model = %params.model,
        prompt_chars = request.prompt.len(),
        "Dispatching analysis request"
    );

    if ticker.quiet {
        return provider.send(&request.prompt, &params);
    }

    let interval = ticker.interval;
    thread::scope(|scope| {
        // Dropped on unwind, which disconnects the ticker before the scope joins it
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<bool>(1);
        let handle = scope.spawn(move || run_ticker(stop_rx, interval, out));

        let result = provider.send(&request.prompt, &params);

        let _ = stop_tx.send(result.is_ok());
        if handle.join().is_err() {
            warn!("Progress ticker panicked");
        }
        result
    })
}

/// Print a rotating status line every `interval` until told to stop.
///
/// `true` on the channel means the call succeeded; a disconnect counts as
/// failure.
fn run_ticker<W: Write>(stop: Receiver<bool>, interval: Duration, mut out: W) {
    let start = Instant::now();
    let mut idx = 0usize;

    let succeeded = loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let category = RUBRIC_CATEGORIES[idx % RUBRIC_CATEGORIES.len()];
                let _ = writeln!(
                    out,
                    "   ⏱️  {} - Analyzing: {}",
                    format_elapsed(start.elapsed()),
                    category
                );
                let _ = out.flush();
                idx += 1;
            }
            Ok(ok) => break ok,
            Err(RecvTimeoutError::Disconnected) => break false,
        }
    };

    let secs = start.elapsed().as_secs();
    let line = if succeeded {
        format!("   ✓ Analysis complete! (took {}m {}s)", secs / 60, secs % 60)
    } else {
        format!("   ✗ Analysis aborted after {}m {}s", secs / 60, secs % 60)
    };
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use std::sync::{Arc, Mutex};

    /// Writer shared with the test so output can be inspected after dispatch
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    enum Behaviour {
        Reply(&'static str),
        Fail,
        Panic,
    }

    struct SlowProvider {
        delay: Duration,
        behaviour: Behaviour,
    }

    impl LlmProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn send(&self, _prompt: &str, _params: &GenerationParams) -> AiResult<String> {
            thread::sleep(self.delay);
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(AiError::ApiError {
                    status: 429,
                    message: "rate limited".into(),
                }),
                Behaviour::Panic => panic!("provider exploded"),
            }
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            prompt: "prompt".into(),
            provider: "slow".into(),
            model: "m".into(),
            max_tokens: 100,
            temperature: 0.0,
            timeout: Duration::from_secs(1),
            confidence_threshold: 70,
            service_name: "svc".into(),
        }
    }

    fn fast_ticker() -> TickerConfig {
        TickerConfig {
            interval: Duration::from_millis(10),
            quiet: false,
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
    }

    #[test]
    fn test_success_prints_status_then_completion() {
        let out = Captured::default();
        let provider = SlowProvider {
            delay: Duration::from_millis(60),
            behaviour: Behaviour::Reply("raw"),
        };

        let text =
            dispatch_with_output(&provider, &request(), &fast_ticker(), out.clone()).unwrap();
        assert_eq!(text, "raw");

        let log = out.text();
        assert!(log.contains("Analyzing: Code Architecture & Design"));
        assert!(log.trim_end().ends_with(")"));
        assert!(log.contains("Analysis complete!"));
    }

    #[test]
    fn test_ticker_stopped_on_error_path() {
        let out = Captured::default();
        let provider = SlowProvider {
            delay: Duration::from_millis(30),
            behaviour: Behaviour::Fail,
        };

        let result = dispatch_with_output(&provider, &request(), &fast_ticker(), out.clone());
        assert!(matches!(result, Err(AiError::ApiError { status: 429, .. })));

        // The ticker has been joined: its final line is present and nothing
        // is written afterwards.
        let after_return = out.text();
        assert!(after_return.contains("Analysis aborted"));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(out.text(), after_return);
    }

    #[test]
    fn test_ticker_stopped_when_provider_panics() {
        let out = Captured::default();
        let provider = SlowProvider {
            delay: Duration::from_millis(20),
            behaviour: Behaviour::Panic,
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            dispatch_with_output(&provider, &request(), &fast_ticker(), out.clone())
        }));
        assert!(result.is_err());
        assert!(out.text().contains("Analysis aborted"));
    }

    #[test]
    fn test_quiet_mode_prints_nothing() {
        let out = Captured::default();
        let provider = SlowProvider {
            delay: Duration::from_millis(30),
            behaviour: Behaviour::Reply("raw"),
        };
        let ticker = TickerConfig {
            interval: Duration::from_millis(5),
            quiet: true,
        };

        dispatch_with_output(&provider, &request(), &ticker, out.clone()).unwrap();
        assert!(out.text().is_empty());
    }
}
