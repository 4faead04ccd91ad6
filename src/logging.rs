use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` replaces the default
/// `info` filter when set.
pub fn init() {
    setup_console();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_ansi(true)
        .init();
}

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(windows)]
fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_OUTPUT_HANDLE,
    };
    // UTF-8 output and ANSI colours for the fmt layer.
    unsafe {
        SetConsoleOutputCP(65001);
        let handle = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(handle, &mut mode) != 0 {
            SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

#[cfg(not(windows))]
fn setup_console() {}
