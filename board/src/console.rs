//! Console output used by the logger.
//!
//! The platform installs a [ConsoleSink] once; until then everything printed is dropped.

use core::fmt::{Arguments, Write};
use spin::Once;

/// Byte sink for console text, e.g. a polled UART.
pub trait ConsoleSink: Sync {
    fn put_str(&self, s: &str);
}

static CONSOLE: Once<&'static dyn ConsoleSink> = Once::new();

/// Install the console sink. Return `false` if a sink was already installed.
pub fn set_console(sink: &'static dyn ConsoleSink) -> bool {
    let mut installed = false;
    CONSOLE.call_once(|| {
        installed = true;
        sink
    });
    installed
}

struct SerialOut;

impl Write for SerialOut {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        if let Some(sink) = CONSOLE.get() {
            sink.put_str(s);
        }
        Ok(())
    }
}

pub fn serial_print(args: Arguments) {
    // SerialOut never reports an error.
    let _ = SerialOut.write_fmt(args);
}

#[macro_export]
/// print string macro
macro_rules! kserial_print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::serial_print(format_args!($fmt $(, $($arg)+)?));
    }
}

#[macro_export]
macro_rules! kserial_println {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::serial_print(format_args!(concat!($fmt, "\n") $(, $($arg)+)?));   // Use LF instead of CR-LF
    }
}
