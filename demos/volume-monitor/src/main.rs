//! Sample host for volume-control.
//!
//! ```text
//! volume-monitor                          # listen and print volume events
//! volume-monitor listen '{"emitOnStart": true}'
//! volume-monitor getVolume
//! volume-monitor setVolume '{"volume": 0.4}'
//! volume-monitor raiseVolume '{"step": 0.1}'
//! ```
//!
//! Logging is controlled with `RUST_LOG`.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use volume_control_core::{
    DeviceBinding, EventStreamSink, MethodCall, MethodResponse, VolumeConfiguration, VolumePlugin,
};

const LISTEN: &str = "listen";

/// Prints stream values as JSON lines.
struct StdoutStream {
    ended: AtomicBool,
}

impl EventStreamSink for StdoutStream {
    fn success(&self, value: Value) {
        println!("{}", value);
    }

    fn end_of_stream(&self) {
        println!("end of stream");
        self.ended.store(true, Ordering::SeqCst);
    }
}

#[cfg(target_os = "windows")]
fn platform_binding() -> volume_control_windows::EndpointVolumeBinding {
    volume_control_windows::EndpointVolumeBinding::new()
}

#[cfg(target_os = "linux")]
fn platform_binding() -> volume_control_linux::AlsaMixerBinding {
    volume_control_linux::AlsaMixerBinding::new(volume_control_linux::AlsaMixerOptions::default())
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn platform_binding() -> volume_control_core::mock::MockBinding {
    log::warn!("No native backend for this platform; using an in-memory device");
    volume_control_core::mock::MockBinding::stepped(100, 50)
}

fn parse_args(raw: Option<String>) -> Result<Value, String> {
    match raw {
        Some(text) => serde_json::from_str(&text).map_err(|e| format!("invalid JSON arguments: {}", e)),
        None => Ok(Value::Null),
    }
}

fn listen<B: DeviceBinding>(plugin: &mut VolumePlugin<B>, args: &Value) -> ExitCode {
    let stream = Arc::new(StdoutStream {
        ended: AtomicBool::new(false),
    });
    if let Err(e) = plugin.listen(args, stream.clone()) {
        eprintln!("{}", serde_json::to_string(&e).unwrap_or_else(|_| e.message.clone()));
        return ExitCode::FAILURE;
    }
    log::info!("Listening for volume changes");

    while !stream.ended.load(Ordering::SeqCst) {
        plugin.dispatch_next(Duration::from_millis(500));
    }
    ExitCode::SUCCESS
}

fn call<B: DeviceBinding>(plugin: &mut VolumePlugin<B>, method: String, args: Value) -> ExitCode {
    let response = plugin.handle(&MethodCall::new(method, args));
    println!("{}", response.to_json());
    match response {
        MethodResponse::Success(_) => ExitCode::SUCCESS,
        MethodResponse::Error(_) | MethodResponse::NotImplemented => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let mut argv = std::env::args().skip(1);
    let method = argv.next().unwrap_or_else(|| LISTEN.to_string());
    let args = match parse_args(argv.next()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut plugin = match VolumePlugin::new(platform_binding(), VolumeConfiguration::default()) {
        Ok(plugin) => plugin,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if method == LISTEN {
        listen(&mut plugin, &args)
    } else {
        call(&mut plugin, method, args)
    }
}
