use std::path::Path;

use fast_image_resize as fir;
use image::RgbaImage;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Display side of the pipeline. Window management, full-screen handling and
/// overlay rendering live behind this seam.
pub trait Presenter: Send {
    /// Current drawable area; queried for every slide so resizes are honoured.
    fn viewport(&self) -> Viewport;

    /// Show a slide that has already been scaled to the viewport.
    fn present(&mut self, image: RgbaImage, path: &Path);

    /// Pause entered: overlay the source path of the slide on screen.
    fn show_overlay(&mut self, path: &Path);

    /// Pause left: remove the overlay.
    fn clear_overlay(&mut self);
}

/// Size of an `width`x`height` image scaled to fit `viewport` with its
/// aspect ratio preserved.
///
/// The image is divided by `max(width / vw, height / vh)`, so images smaller
/// than the viewport grow to fill it unless `allow_upscale` is false, in
/// which case they keep their native size. Integer arithmetic along the
/// limiting axis keeps the result exact; neither side drops below one pixel.
pub fn scaled_size(width: u32, height: u32, viewport: Viewport, allow_upscale: bool) -> (u32, u32) {
    if width == 0 || height == 0 || viewport.width == 0 || viewport.height == 0 {
        return (width, height);
    }
    if !allow_upscale && width <= viewport.width && height <= viewport.height {
        return (width, height);
    }
    let (w, h) = (u64::from(width), u64::from(height));
    let (vw, vh) = (u64::from(viewport.width), u64::from(viewport.height));

    // w/vw >= h/vh, cross-multiplied
    if w * vh >= h * vw {
        let out_h = (h * vw / w).max(1);
        (viewport.width, clamp_u32(out_h))
    } else {
        let out_w = (w * vh / h).max(1);
        (clamp_u32(out_w), viewport.height)
    }
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Resize `image` to [`scaled_size`] for `viewport`.
///
/// # Errors
/// Returns [`Error::Resize`] if the resampler rejects the buffers.
pub fn scale_to_viewport(image: RgbaImage, viewport: Viewport, allow_upscale: bool) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    let (target_w, target_h) = scaled_size(width, height, viewport, allow_upscale);
    if (target_w, target_h) == (width, height) {
        return Ok(image);
    }

    let src_view = fir::images::ImageRef::new(width, height, image.as_raw(), fir::PixelType::U8x4)
        .map_err(|err| Error::Resize(format!("source view: {err}")))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options =
        fir::ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| Error::Resize(err.to_string()))?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| Error::Resize("resized buffer has unexpected length".into()))
}

/// Presenter for headless runs: reports every directive through `tracing`.
#[derive(Debug)]
pub struct TracingPresenter {
    viewport: Viewport,
}

impl TracingPresenter {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }
}

impl Presenter for TracingPresenter {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self, image: RgbaImage, path: &Path) {
        let (width, height) = image.dimensions();
        info!(path = %path.display(), width, height, "presenting slide");
    }

    fn show_overlay(&mut self, path: &Path) {
        info!(path = %path.display(), "paused");
    }

    fn clear_overlay(&mut self) {
        info!("resumed");
    }
}
