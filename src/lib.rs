#![warn(clippy::all, rust_2018_idioms)]

//! Split one image into four stacked horizontal strips, preview them, and
//! save/download each strip as a standalone PNG.

mod app;
mod error;
mod export;
mod file_picker;
mod slicer;

pub use app::SplitterApp;
pub use error::SplitError;
pub use export::{DELIVERY_STAGGER, artifact_name, delivery_schedule};
pub use slicer::{SLICE_COUNT, Slice, band_layout, slice_image};

use eframe::NativeOptions;

#[cfg(target_os = "android")]
use egui_winit::winit;

impl SplitterApp {
    /// Run the app with provided NativeOptions (used by Android entrypoint).
    pub fn run(options: NativeOptions) -> Result<(), eframe::Error> {
        eframe::run_native(
            "quadsplit",
            options,
            Box::new(|cc| Ok(Box::new(SplitterApp::new(cc)))),
        )
    }
}

#[cfg(target_os = "android")]
#[allow(unsafe_code)]
#[unsafe(no_mangle)]
pub extern "C" fn android_main(app: winit::platform::android::activity::AndroidApp) {
    use eframe::Renderer;

    unsafe {
        std::env::set_var("RUST_BACKTRACE", "full");
    }
    android_logger::init_once(
        android_logger::Config::default().with_max_level(log::LevelFilter::Info),
    );

    let options = NativeOptions {
        android_app: Some(app),
        renderer: Renderer::Wgpu,
        ..Default::default()
    };

    SplitterApp::run(options).unwrap();
}
