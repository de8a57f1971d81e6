//! Composite filter-graph construction.
//!
//! The background is time-remapped to the foreground's duration and
//! resampled back to its own frame rate; the foreground is scaled and
//! overlaid bottom-left. Neither input ending first may terminate the
//! output early, hence `eof_action=pass` and `shortest=0`.

/// Overlay placement and scale for the foreground clip.
#[derive(Debug, Clone, Copy)]
pub struct OverlayLayout {
    /// Uniform scale applied to both foreground dimensions
    pub scale_ratio: f64,
    /// Left margin in pixels
    pub margin_x: u32,
    /// Bottom margin in pixels
    pub margin_y: u32,
}

/// Presentation-timestamp scale factor that stretches or compresses the
/// background to the target (foreground) duration.
///
/// Values > 1 slow the background down, < 1 speed it up.
pub fn remap_factor(bg_duration: f64, target_duration: f64) -> f64 {
    target_duration / bg_duration
}

/// Build the composite filter graph.
///
/// `[0:v]` is the background, `[1:v]` the foreground; the composited video
/// leaves the graph as `[vout]`. The `fps` resample after `setpts` keeps the
/// background at its original frame rate so the timestamp scaling does not
/// introduce a rate mismatch.
pub fn build_composite_filter(factor: f64, bg_fps: f64, layout: OverlayLayout) -> String {
    format!(
        "[0:v]setpts=PTS*{factor:.8},fps={bg_fps:.6}:round=near[bg];\
         [1:v]setpts=PTS-STARTPTS,scale=iw*{ratio:.4}:ih*{ratio:.4}[fg];\
         [bg][fg]overlay={mx}:H-h-{my}:eof_action=pass:shortest=0[vout]",
        factor = factor,
        bg_fps = bg_fps,
        ratio = layout.scale_ratio,
        mx = layout.margin_x,
        my = layout.margin_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: OverlayLayout = OverlayLayout {
        scale_ratio: 0.18,
        margin_x: 18,
        margin_y: 18,
    };

    #[test]
    fn test_remap_factor_stretch() {
        assert!((remap_factor(10.0, 15.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_remap_factor_compress() {
        assert!((remap_factor(15.0, 10.0) - 0.6667).abs() < 1e-3);
    }

    #[test]
    fn test_filter_graph_shape() {
        let graph = build_composite_filter(1.5, 30.0, LAYOUT);
        assert!(graph.starts_with("[0:v]setpts=PTS*1.50000000,fps=30.000000:round=near[bg]"));
        assert!(graph.contains("[1:v]setpts=PTS-STARTPTS,scale=iw*0.1800:ih*0.1800[fg]"));
        assert!(graph.ends_with("[bg][fg]overlay=18:H-h-18:eof_action=pass:shortest=0[vout]"));
    }

    #[test]
    fn test_overlay_anchored_bottom_left() {
        let graph = build_composite_filter(
            1.0,
            25.0,
            OverlayLayout {
                scale_ratio: 0.25,
                margin_x: 12,
                margin_y: 24,
            },
        );
        assert!(graph.contains("overlay=12:H-h-24"));
    }
}
