use wasm_bindgen::JsValue;

pub(crate) fn info(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}
