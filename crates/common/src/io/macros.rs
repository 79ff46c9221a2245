/// Prints a formatted line to stdout, unless the shell is quiet.
#[macro_export]
macro_rules! sh_println {
    () => {
        $crate::io::shell::println(::core::format_args!(""))
    };
    ($($t:tt)*) => {
        $crate::io::shell::println(::core::format_args!($($t)*))
    };
}

/// Prints a formatted warning to stderr.
#[macro_export]
macro_rules! sh_warn {
    ($($t:tt)*) => {
        $crate::io::shell::warn(::core::format_args!($($t)*))
    };
}

/// Prints a formatted error to stderr.
#[macro_export]
macro_rules! sh_err {
    ($($t:tt)*) => {
        $crate::io::shell::error(::core::format_args!($($t)*))
    };
}
