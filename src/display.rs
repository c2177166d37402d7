// display.rs: notification level shared by the library and the CLI.
//
// There is no logging facade: diagnostics go to stderr, gated by a global
// level. 0 = silent, 1 = errors only, 2 = results + warnings, 3 = progress,
// 4+ = verbose.

use std::sync::atomic::{AtomicI32, Ordering};

/// Global notification level. Libraries embedding `flzma2` keep the default
/// (silent); the CLI raises it to 2.
pub static DISPLAY_LEVEL: AtomicI32 = AtomicI32::new(0);

/// Current notification level.
#[inline]
pub fn display_level() -> i32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Set the notification level and return it.
pub fn set_display_level(level: i32) -> i32 {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
    level
}

/// Print to stderr when the notification level is at least `$level`.
/// Flushes stderr at level 4 and above so progress lines interleave sanely.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::display::display_level() >= $level {
            eprint!($($arg)*);
            if $crate::display::display_level() >= 4 {
                use std::io::Write;
                let _ = std::io::stderr().flush();
            }
        }
    };
}
