pub mod device_binding;
pub mod event_sink;
