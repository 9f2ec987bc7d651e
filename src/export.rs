//! Turning slices into downloadable/saveable artifacts.
//!
//! On the web, browsers drop all but the first of several programmatic
//! downloads triggered in the same tick, so "download all" spaces the four
//! deliveries 200ms apart. That stagger is a rate limit for the browser's
//! download channel only; native builds write straight to disk with no delay.

use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use crate::error::SplitError;
#[cfg(not(target_arch = "wasm32"))]
use crate::slicer::Slice;

/// Gap between successive "download all" deliveries on the web.
pub const DELIVERY_STAGGER: Duration = Duration::from_millis(200);

/// Artifact file name for a slice: `split_1.png` .. `split_4.png`.
pub fn artifact_name(index: usize) -> String {
    format!("split_{}.png", index + 1)
}

/// Offsets at which each delivery fires, in index order: `i * 200ms`.
pub fn delivery_schedule(count: usize) -> Vec<Duration> {
    (0..count as u32).map(|i| DELIVERY_STAGGER * i).collect()
}

/// Writes one slice's PNG buffer to `path`.
#[cfg(not(target_arch = "wasm32"))]
pub fn save_slice(slice: &Slice, path: &std::path::Path) -> Result<(), SplitError> {
    std::fs::write(path, &slice.png).map_err(|e| SplitError::Io {
        name: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Writes every non-empty slice into `dir` under its [`artifact_name`].
/// Zero-height bands have no encodable artifact and are skipped.
#[cfg(not(target_arch = "wasm32"))]
pub fn save_all(
    slices: &[Slice],
    dir: &std::path::Path,
) -> Result<Vec<std::path::PathBuf>, SplitError> {
    let mut written = Vec::with_capacity(slices.len());
    for slice in slices {
        if slice.png.is_empty() {
            continue;
        }
        let path = dir.join(artifact_name(slice.index));
        save_slice(slice, &path)?;
        log::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(target_arch = "wasm32")]
mod web {
    use base64::Engine as _;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use super::{artifact_name, delivery_schedule};
    use crate::slicer::Slice;

    /// Synthesizes an anchor click on a `data:` URL, the same trick a plain
    /// web page uses to hand a generated file to the browser.
    fn trigger_download(name: &str, png: &[u8]) {
        let document = match web_sys::window().and_then(|w| w.document()) {
            Some(d) => d,
            None => return,
        };
        let anchor = match document
            .create_element("a")
            .ok()
            .and_then(|el| el.dyn_into::<web_sys::HtmlAnchorElement>().ok())
        {
            Some(a) => a,
            None => return,
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        anchor.set_href(&format!("data:image/png;base64,{encoded}"));
        anchor.set_download(name);
        anchor.click();
    }

    /// Immediate single-slice download; empty bands have nothing to deliver.
    pub fn download_slice(slice: &Slice) {
        if slice.png.is_empty() {
            return;
        }
        trigger_download(&artifact_name(slice.index), &slice.png);
    }

    /// Schedules one download per slice at `index * 200ms`. Once scheduled,
    /// each delivery fires independently; there is no way to abort the
    /// sequence (bounded at four deliveries, ~600ms total).
    pub fn download_all(slices: &[Slice]) {
        let window = match web_sys::window() {
            Some(w) => w,
            None => return,
        };

        for (slice, delay) in slices.iter().zip(delivery_schedule(slices.len())) {
            if slice.png.is_empty() {
                continue;
            }
            let name = artifact_name(slice.index);
            let png = slice.png.clone();
            let callback = Closure::once(move || trigger_download(&name, &png));
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay.as_millis() as i32,
            );
            callback.forget(); // fires once; at most four closures leak
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{download_all, download_slice};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_one_based() {
        assert_eq!(artifact_name(0), "split_1.png");
        assert_eq!(artifact_name(3), "split_4.png");
    }

    #[test]
    fn schedule_staggers_in_index_order() {
        let schedule = delivery_schedule(4);
        assert_eq!(
            schedule,
            vec![
                Duration::ZERO,
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(600),
            ]
        );
        assert!(schedule.windows(2).all(|w| w[0] < w[1]));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn save_all_skips_empty_bands() {
        let dir = std::env::temp_dir().join("quadsplit_save_all_test");
        std::fs::create_dir_all(&dir).unwrap();

        let slices = vec![
            Slice {
                index: 0,
                start_y: 0,
                height: 0,
                png: Vec::new(),
            },
            Slice {
                index: 3,
                start_y: 0,
                height: 3,
                png: vec![1, 2, 3],
            },
        ];

        let written = save_all(&slices, &dir).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("split_4.png"));
        assert_eq!(std::fs::read(&written[0]).unwrap(), vec![1, 2, 3]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
