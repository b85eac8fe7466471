//! 通用工具：panic hook 与控制台日志。

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

#[cfg(target_arch = "wasm32")]
mod sink {
    pub fn info(message: &str) {
        web_sys::console::log_1(&message.into());
    }

    pub fn warn(message: &str) {
        web_sys::console::warn_1(&message.into());
    }

    pub fn error(message: &str) {
        web_sys::console::error_1(&message.into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod sink {
    pub fn info(message: &str) {
        println!("{message}");
    }

    pub fn warn(message: &str) {
        eprintln!("{message}");
    }

    pub fn error(message: &str) {
        eprintln!("{message}");
    }
}

pub fn log_info(scope: &str, message: &str) {
    sink::info(&format!("[combat:{scope}] {message}"));
}

pub fn log_warn(scope: &str, message: &str) {
    sink::warn(&format!("[combat:{scope}] {message}"));
}

pub fn log_error(scope: &str, message: &str) {
    sink::error(&format!("[combat:{scope}] {message}"));
}
