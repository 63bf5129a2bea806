use ratatui::prelude::*;
use ratatui_image::protocol::StatefulProtocolType;
use ratatui_image::{CropOptions, Resize, StatefulImage};

use crate::app::Model;

/// Draw materialized media (diagrams and images) into the preview pane.
///
/// Renders each protocol into a temp buffer and blits the rows that
/// intersect the viewport, so partially scrolled media clip correctly.
pub fn render_media(model: &mut Model, frame: &mut Frame, doc_area: Rect) {
    let vp_top = model.viewport.offset() as i32;
    let vp_bottom = vp_top + i32::from(doc_area.height);

    if model.media_protocols.is_empty() {
        return;
    }

    for media_ref in model.document.media() {
        let Some((protocol, media_width, media_height)) =
            model.media_protocols.get_mut(&media_ref.src)
        else {
            continue;
        };
        let media_width = *media_width;
        let media_height = *media_height;

        #[allow(clippy::cast_possible_wrap)]
        let media_top = media_ref.line_range.start as i32;
        let media_bottom = media_top + i32::from(media_height);

        // Skip if no overlap with viewport
        if media_bottom <= vp_top || media_top >= vp_bottom {
            continue;
        }
        crate::perf::log_event(
            "render.media.visible",
            format!(
                "src={} rows={}..{} size={}x{}",
                media_ref.src, media_top, media_bottom, media_width, media_height
            ),
        );

        // Which rows of the temp buffer are visible
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let src_start = (vp_top - media_top).max(0) as u16;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let dst_y = doc_area.y + (media_top - vp_top).max(0) as u16;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let visible_rows = (media_bottom.min(vp_bottom) - media_top.max(vp_top)).max(0) as u16;
        let visible_cols = media_width.min(doc_area.width);
        if visible_rows == 0 || visible_cols == 0 {
            continue;
        }

        if matches!(protocol.protocol_type(), StatefulProtocolType::ITerm2(_)) {
            // iTerm2 inline graphics store the payload in a single anchor
            // cell; row-slicing the rendered buffer breaks scrolling.
            let crop = if src_start > 0 {
                Resize::Crop(Some(CropOptions {
                    clip_top: true,
                    clip_left: false,
                }))
            } else {
                Resize::Crop(None)
            };
            let widget = StatefulImage::default().resize(crop);
            widget.render(
                Rect::new(doc_area.x, dst_y, visible_cols, visible_rows),
                frame.buffer_mut(),
                protocol,
            );
            continue;
        }

        // Other protocols are safe to render to a temp buffer and blit.
        let temp_area = Rect::new(0, 0, media_width, media_height);
        let mut temp_buf = ratatui::buffer::Buffer::empty(temp_area);
        let resize = if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
            // Nearest-neighbor causes strong color aliasing in half-cell mode.
            Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
        } else {
            Resize::Scale(None)
        };
        let widget = StatefulImage::default().resize(resize);
        widget.render(temp_area, &mut temp_buf, protocol);

        // Non-truecolor terminals behave better with indexed colors in
        // halfblock mode.
        if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_))
            && !crate::media::supports_truecolor_terminal()
        {
            for row in 0..temp_area.height {
                for col in 0..temp_area.width {
                    let cell = &mut temp_buf[(col, row)];
                    if let Color::Rgb(r, g, b) = cell.fg {
                        cell.fg = Color::Indexed(crate::media::rgb_to_xterm_256(r, g, b));
                    }
                    if let Color::Rgb(r, g, b) = cell.bg {
                        cell.bg = Color::Indexed(crate::media::rgb_to_xterm_256(r, g, b));
                    }
                }
            }
        }

        let frame_buf = frame.buffer_mut();
        for row in 0..visible_rows {
            let src_row = src_start + row;
            let dst_row = dst_y + row;
            if src_row < media_height && dst_row < frame_buf.area.height {
                for col in 0..visible_cols {
                    let src_cell = &temp_buf[(col, src_row)];
                    let dst_cell = &mut frame_buf[(doc_area.x + col, dst_row)];
                    *dst_cell = src_cell.clone();
                }
            }
        }
        crate::perf::log_event(
            "render.media.blit",
            format!(
                "src={} src_start={src_start} dst_y={dst_y} rows={visible_rows} cols={visible_cols}",
                media_ref.src
            ),
        );
    }
}
