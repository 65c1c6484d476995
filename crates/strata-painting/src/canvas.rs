//! The canvas seam between the core and the 2D graphics backend, plus
//! picture recording.

use std::sync::Arc;

use strata_types::{Matrix, Path, Rect, Scalar};

use crate::bitmap::Image;
use crate::paint::Paint;

/// The drawing operations the core emits.
///
/// The real GPU/CPU backend implements this; so does [`PictureRecorder`]'s
/// recording canvas.
pub trait Canvas {
    /// Saves the current clip/transform state, returning the save count
    /// prior to the save.
    fn save(&mut self) -> usize;

    /// Saves into an offscreen layer composited on restore with `paint`.
    fn save_layer(&mut self, paint: Option<&Paint>) -> usize;

    fn restore(&mut self);

    fn restore_to_count(&mut self, count: usize);

    fn scale(&mut self, sx: Scalar, sy: Scalar);

    fn concat(&mut self, matrix: &Matrix);

    fn clip_rect(&mut self, rect: Rect, anti_alias: bool);

    fn clip_path(&mut self, path: &Path, anti_alias: bool);

    fn draw_rect(&mut self, rect: Rect, paint: &Paint);

    fn draw_path(&mut self, path: &Path, paint: &Paint);

    /// Fills the current clip with `paint`.
    fn draw_paint(&mut self, paint: &Paint);

    fn draw_image(&mut self, image: &Image, x: Scalar, y: Scalar, paint: Option<&Paint>);

    fn draw_image_rect(&mut self, image: &Image, src: Rect, dst: Rect, paint: Option<&Paint>);

    fn draw_picture(&mut self, picture: &Arc<Picture>, matrix: Option<&Matrix>, paint: Option<&Paint>);
}

/// One recorded canvas operation.
#[derive(Debug, Clone)]
pub enum PictureOp {
    Save,
    SaveLayer(Option<Paint>),
    Restore,
    RestoreToCount(usize),
    Scale(Scalar, Scalar),
    Concat(Matrix),
    ClipRect { rect: Rect, anti_alias: bool },
    ClipPath { path: Path, anti_alias: bool },
    DrawRect { rect: Rect, paint: Paint },
    DrawPath { path: Path, paint: Paint },
    DrawPaint { paint: Paint },
    DrawImage { image: Image, x: Scalar, y: Scalar, paint: Option<Paint> },
    DrawImageRect { image: Image, src: Rect, dst: Rect, paint: Option<Paint> },
    DrawPicture { picture: Arc<Picture>, matrix: Option<Matrix>, paint: Option<Paint> },
}

/// An immutable, shareable recording of canvas operations.
///
/// Identity (`Arc` pointer) is what display lists and the damage resolver
/// compare; the command list itself is only walked during playback.
#[derive(Debug)]
pub struct Picture {
    ops: Vec<PictureOp>,
    cull_rect: Rect,
}

impl Picture {
    /// The bounds the recording was made against.
    #[inline]
    pub fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    #[inline]
    pub fn ops(&self) -> &[PictureOp] {
        &self.ops
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Replays the recorded operations onto `canvas`, bracketed by a save so
    /// recorded state changes cannot leak.
    pub fn playback(&self, canvas: &mut dyn Canvas) {
        let save_count = canvas.save();

        for op in &self.ops {
            match op {
                PictureOp::Save => {
                    canvas.save();
                }
                PictureOp::SaveLayer(paint) => {
                    canvas.save_layer(paint.as_ref());
                }
                PictureOp::Restore => canvas.restore(),
                PictureOp::RestoreToCount(count) => canvas.restore_to_count(*count),
                PictureOp::Scale(sx, sy) => canvas.scale(*sx, *sy),
                PictureOp::Concat(matrix) => canvas.concat(matrix),
                PictureOp::ClipRect { rect, anti_alias } => canvas.clip_rect(*rect, *anti_alias),
                PictureOp::ClipPath { path, anti_alias } => canvas.clip_path(path, *anti_alias),
                PictureOp::DrawRect { rect, paint } => canvas.draw_rect(*rect, paint),
                PictureOp::DrawPath { path, paint } => canvas.draw_path(path, paint),
                PictureOp::DrawPaint { paint } => canvas.draw_paint(paint),
                PictureOp::DrawImage { image, x, y, paint } => {
                    canvas.draw_image(image, *x, *y, paint.as_ref());
                }
                PictureOp::DrawImageRect { image, src, dst, paint } => {
                    canvas.draw_image_rect(image, *src, *dst, paint.as_ref());
                }
                PictureOp::DrawPicture { picture, matrix, paint } => {
                    canvas.draw_picture(picture, matrix.as_ref(), paint.as_ref());
                }
            }
        }

        canvas.restore_to_count(save_count);
    }
}

/// Records canvas operations into a [`Picture`].
#[derive(Debug, Default)]
pub struct PictureRecorder {
    recording: Option<RecordingCanvas>,
}

impl PictureRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording against `bounds` and returns the recording canvas.
    /// Calling this again restarts the recording.
    pub fn begin_recording(&mut self, bounds: Rect) -> &mut RecordingCanvas {
        self.recording = Some(RecordingCanvas {
            ops: Vec::new(),
            cull_rect: bounds,
            save_count: 0,
        });
        self.recording.as_mut().expect("recording was just started")
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn canvas(&mut self) -> Option<&mut RecordingCanvas> {
        self.recording.as_mut()
    }

    /// Finishes the recording, returning `None` when recording never began.
    pub fn finish_recording_as_picture(&mut self) -> Option<Arc<Picture>> {
        self.recording.take().map(|recording| {
            Arc::new(Picture {
                ops: recording.ops,
                cull_rect: recording.cull_rect,
            })
        })
    }
}

/// The canvas handed out by [`PictureRecorder::begin_recording`].
#[derive(Debug)]
pub struct RecordingCanvas {
    ops: Vec<PictureOp>,
    cull_rect: Rect,
    save_count: usize,
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) -> usize {
        let count = self.save_count;
        self.save_count += 1;
        self.ops.push(PictureOp::Save);
        count
    }

    fn save_layer(&mut self, paint: Option<&Paint>) -> usize {
        let count = self.save_count;
        self.save_count += 1;
        self.ops.push(PictureOp::SaveLayer(paint.cloned()));
        count
    }

    fn restore(&mut self) {
        self.save_count = self.save_count.saturating_sub(1);
        self.ops.push(PictureOp::Restore);
    }

    fn restore_to_count(&mut self, count: usize) {
        self.save_count = self.save_count.min(count);
        self.ops.push(PictureOp::RestoreToCount(count));
    }

    fn scale(&mut self, sx: Scalar, sy: Scalar) {
        self.ops.push(PictureOp::Scale(sx, sy));
    }

    fn concat(&mut self, matrix: &Matrix) {
        self.ops.push(PictureOp::Concat(*matrix));
    }

    fn clip_rect(&mut self, rect: Rect, anti_alias: bool) {
        self.ops.push(PictureOp::ClipRect { rect, anti_alias });
    }

    fn clip_path(&mut self, path: &Path, anti_alias: bool) {
        self.ops.push(PictureOp::ClipPath {
            path: path.clone(),
            anti_alias,
        });
    }

    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.ops.push(PictureOp::DrawRect {
            rect,
            paint: paint.clone(),
        });
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.ops.push(PictureOp::DrawPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn draw_paint(&mut self, paint: &Paint) {
        self.ops.push(PictureOp::DrawPaint {
            paint: paint.clone(),
        });
    }

    fn draw_image(&mut self, image: &Image, x: Scalar, y: Scalar, paint: Option<&Paint>) {
        self.ops.push(PictureOp::DrawImage {
            image: image.clone(),
            x,
            y,
            paint: paint.cloned(),
        });
    }

    fn draw_image_rect(&mut self, image: &Image, src: Rect, dst: Rect, paint: Option<&Paint>) {
        self.ops.push(PictureOp::DrawImageRect {
            image: image.clone(),
            src,
            dst,
            paint: paint.cloned(),
        });
    }

    fn draw_picture(
        &mut self,
        picture: &Arc<Picture>,
        matrix: Option<&Matrix>,
        paint: Option<&Paint>,
    ) {
        self.ops.push(PictureOp::DrawPicture {
            picture: Arc::clone(picture),
            matrix: matrix.copied(),
            paint: paint.cloned(),
        });
    }
}
