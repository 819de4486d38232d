// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive 3D alumni card.
//!
//! Both faces are laid out as flat egui shapes in card-local coordinates,
//! tessellated, and every vertex is pushed through the card's rotation and
//! perspective before painting. Pointer input only updates the
//! presentation state; the springs are advanced once per frame here.

use crate::models::presentation::{PresentationRenderer, VisualParams};
use crate::util::geometry::{normalize_coordinates, CardTransform};
use egui::epaint::{ClippedShape, Primitive};
use egui::{Color32, Pos2, Rect, Shape, Stroke, Vec2};

/// Card size at full scale, in points.
const CARD_SIZE: Vec2 = Vec2::new(640.0, 400.0);
const CARD_ROUNDING: f32 = 24.0;

const GOLD_LIGHT: Color32 = Color32::from_rgb(0x8a, 0x6b, 0x23);
const GOLD_MID: Color32 = Color32::from_rgb(0x7a, 0x5b, 0x1c);
const GOLD_DARK: Color32 = Color32::from_rgb(0x5e, 0x46, 0x14);
const BORDER: Color32 = Color32::from_rgb(0x4b, 0x55, 0x63);

/// Result of card interaction.
pub enum CardAction {
    None,
    BackToForm,
}

/// Images shown on the card.
pub struct CardTextures<'a> {
    pub photo: Option<&'a egui::TextureHandle>,
    pub qr: Option<&'a egui::TextureHandle>,
}

/// Display the card and handle pointer interaction.
pub fn show(
    ui: &mut egui::Ui,
    renderer: &mut PresentationRenderer,
    textures: &CardTextures,
) -> CardAction {
    let mut action = CardAction::None;

    ui.horizontal(|ui| {
        if ui.button("⬅ Back to form").clicked() {
            action = CardAction::BackToForm;
        }
        ui.label(
            egui::RichText::new("Move the pointer over the card to tilt it, click to flip")
                .italics()
                .weak(),
        );
    });

    let area = ui.available_rect_before_wrap();
    let fit = ((area.width() - 80.0) / CARD_SIZE.x)
        .min((area.height() - 80.0) / CARD_SIZE.y)
        .clamp(0.3, 1.0);
    let size = CARD_SIZE * fit;
    let card_rect = Rect::from_center_size(area.center(), size);

    let response = ui.allocate_rect(card_rect, egui::Sense::click());

    // Pointer state
    let hovered = response.hovered();
    if hovered && !renderer.is_hovered() {
        renderer.on_pointer_enter();
    } else if !hovered && renderer.is_hovered() {
        renderer.on_pointer_leave();
    }
    if let Some(pos) = response.hover_pos() {
        let (x, y) = normalize_coordinates(
            pos.x - card_rect.min.x,
            pos.y - card_rect.min.y,
            card_rect.width(),
            card_rect.height(),
        );
        renderer.on_pointer_move(x, y);
    }
    if response.clicked() {
        renderer.on_activate();
    }
    if hovered {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    // Advance animation
    let dt = ui.input(|i| i.stable_dt).min(0.1);
    let params = if dt > 0.0 {
        renderer.tick(dt)
    } else {
        renderer.current()
    };
    if !renderer.is_settled() {
        ui.ctx().request_repaint();
    }

    let transform = CardTransform {
        face_deg: params.visible_face_angle(),
        rotate_x_deg: params.rotate_x,
        rotate_y_deg: params.rotate_y,
        scale: params.scale,
        lift: params.lift,
        perspective: renderer.perspective(),
    };

    let painter = ui.painter_at(area);
    paint_shadow(&painter, &params, &transform, card_rect.center(), size, fit);

    let shapes = if params.front_visible {
        front_shapes(ui.ctx(), renderer, textures, size, fit)
    } else {
        back_shapes(textures, fit)
    };
    paint_projected(ui.ctx(), &painter, shapes, &transform, card_rect.center(), size);

    action
}

/// Diagonal gold gradient at a card-local position.
fn gold_at(pos: Pos2, size: Vec2) -> Color32 {
    let u = (pos.x / size.x + 0.5).clamp(0.0, 1.0);
    let v = (pos.y / size.y + 0.5).clamp(0.0, 1.0);
    let t = (u + v) * 0.5;
    if t < 0.5 {
        lerp_color(GOLD_LIGHT, GOLD_MID, t * 2.0)
    } else {
        lerp_color(GOLD_MID, GOLD_DARK, (t - 0.5) * 2.0)
    }
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

/// A card-sized rounded rect at the local origin, filled with the marker
/// color that `paint_layer` replaces with the gradient.
fn card_background(size: Vec2, fit: f32) -> Vec<Shape> {
    let rect = Rect::from_center_size(Pos2::ZERO, size);
    vec![
        Shape::rect_filled(rect, CARD_ROUNDING * fit, Color32::WHITE),
        Shape::rect_stroke(rect, CARD_ROUNDING * fit, Stroke::new(1.0, BORDER)),
    ]
}

fn front_shapes(
    ctx: &egui::Context,
    renderer: &PresentationRenderer,
    textures: &CardTextures,
    size: Vec2,
    fit: f32,
) -> Vec<Shape> {
    let payload = renderer.payload();
    let half = size * 0.5;
    let mut shapes = Vec::new();

    ctx.fonts(|fonts| {
        // Title with a soft drop shadow
        let title_font = egui::FontId::proportional(40.0 * fit);
        let title_pos = Pos2::new(0.0, -0.06 * size.y);
        for (offset, color) in [
            (Vec2::new(0.0, 2.0 * fit), Color32::from_black_alpha(170)),
            (Vec2::ZERO, Color32::WHITE),
        ] {
            shapes.push(Shape::text(
                fonts,
                title_pos + offset,
                egui::Align2::CENTER_CENTER,
                "LIFE TIME ALUMNI CARD",
                title_font.clone(),
                color,
            ));
        }

        // Details, bottom left, kept clear of the photo
        let left = -half.x + 40.0 * fit;
        let wrap = size.x - 40.0 * fit - 176.0 * fit;
        let lines = [
            (payload.name.to_uppercase(), 24.0),
            (format!("BATCH: {}", payload.batch).to_uppercase(), 15.0),
            (
                format!("BACHELOR OF TECHNOLOGY IN {}", payload.degree).to_uppercase(),
                15.0,
            ),
        ];
        let galleys: Vec<_> = lines
            .into_iter()
            .map(|(text, pt)| {
                fonts.layout(text, egui::FontId::proportional(pt * fit), Color32::BLACK, wrap)
            })
            .collect();

        let spacing = 6.0 * fit;
        let total: f32 = galleys.iter().map(|g| g.size().y + spacing).sum::<f32>() - spacing;
        let mut y = half.y - 40.0 * fit - total;
        for galley in galleys {
            let height = galley.size().y;
            shapes.push(Shape::galley(Pos2::new(left, y), galley, Color32::BLACK));
            y += height + spacing;
        }
    });

    // Photo, bottom right
    let photo_rect = Rect::from_min_max(
        Pos2::new(half.x - 40.0 * fit - 112.0 * fit, half.y - 40.0 * fit - 128.0 * fit),
        Pos2::new(half.x - 40.0 * fit, half.y - 40.0 * fit),
    );
    match textures.photo {
        Some(texture) => {
            let uv = cover_uv(texture.size_vec2(), photo_rect.size());
            shapes.push(Shape::image(texture.id(), photo_rect, uv, Color32::WHITE));
        }
        None => {
            shapes.push(Shape::rect_filled(photo_rect, 12.0 * fit, Color32::from_gray(200)));
            ctx.fonts(|fonts| {
                shapes.push(Shape::text(
                    fonts,
                    photo_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "PHOTO",
                    egui::FontId::proportional(14.0 * fit),
                    Color32::from_gray(110),
                ));
            });
        }
    }
    shapes.push(Shape::rect_stroke(photo_rect, 12.0 * fit, Stroke::new(2.0 * fit, Color32::WHITE)));

    shapes
}

fn back_shapes(textures: &CardTextures, fit: f32) -> Vec<Shape> {
    let mut shapes = Vec::new();
    let qr_rect = Rect::from_center_size(Pos2::ZERO, Vec2::splat(176.0 * fit));

    if let Some(texture) = textures.qr {
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        shapes.push(Shape::image(texture.id(), qr_rect, uv, Color32::WHITE));
    }
    shapes.push(Shape::rect_stroke(qr_rect, 8.0 * fit, Stroke::new(1.0, Color32::from_gray(160))));
    shapes
}

/// UV rect that crops an image to fill `target` without stretching.
fn cover_uv(image: Vec2, target: Vec2) -> Rect {
    let full = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
    if image.x <= 0.0 || image.y <= 0.0 || target.x <= 0.0 || target.y <= 0.0 {
        return full;
    }
    let image_aspect = image.x / image.y;
    let target_aspect = target.x / target.y;
    if image_aspect > target_aspect {
        // Image is wider - crop the sides
        let w = target_aspect / image_aspect;
        Rect::from_min_max(Pos2::new((1.0 - w) / 2.0, 0.0), Pos2::new((1.0 + w) / 2.0, 1.0))
    } else {
        // Image is taller - crop top and bottom
        let h = image_aspect / target_aspect;
        Rect::from_min_max(Pos2::new(0.0, (1.0 - h) / 2.0), Pos2::new(1.0, (1.0 + h) / 2.0))
    }
}

fn paint_shadow(
    painter: &egui::Painter,
    params: &VisualParams,
    transform: &CardTransform,
    center: Pos2,
    size: Vec2,
    fit: f32,
) {
    let half = size * 0.5;
    let corners = [(-half.x, -half.y), (half.x, -half.y), (half.x, half.y), (-half.x, half.y)];
    let points: Vec<Pos2> = corners
        .iter()
        .map(|&(x, y)| {
            let (px, py) = transform.project(x, y);
            center + Vec2::new(px, py)
        })
        .collect();
    let bounds = Rect::from_points(&points);
    if bounds.width() < 1.0 {
        return;
    }

    let shadow = egui::epaint::Shadow {
        offset: Vec2::new(params.shadow.offset_x, params.shadow.offset_y) * fit,
        blur: params.shadow.blur * fit,
        spread: params.shadow.spread * fit,
        color: Color32::from_black_alpha(128),
    };
    painter.add(shadow.as_shape(bounds, CARD_ROUNDING * fit));
}

/// Paint the card background and the face contents through the card
/// transform.
fn paint_projected(
    ctx: &egui::Context,
    painter: &egui::Painter,
    shapes: Vec<Shape>,
    transform: &CardTransform,
    center: Pos2,
    size: Vec2,
) {
    let fit = size.x / CARD_SIZE.x;
    paint_layer(ctx, painter, card_background(size, fit), transform, center, Some(size));
    paint_layer(ctx, painter, shapes, transform, center, None);
}

/// Tessellate card-local shapes and project every vertex to the screen.
///
/// With `gradient` set, white vertices are recolored with the gold
/// gradient. Solid shapes share one texture with text, so a layer that
/// gets the gradient must not contain text.
fn paint_layer(
    ctx: &egui::Context,
    painter: &egui::Painter,
    shapes: Vec<Shape>,
    transform: &CardTransform,
    center: Pos2,
    gradient: Option<Vec2>,
) {
    let clipped: Vec<ClippedShape> = shapes
        .into_iter()
        .map(|shape| ClippedShape {
            clip_rect: Rect::EVERYTHING,
            shape,
        })
        .collect();

    for primitive in ctx.tessellate(clipped, ctx.pixels_per_point()) {
        let Primitive::Mesh(mut mesh) = primitive.primitive else {
            continue;
        };
        for vertex in &mut mesh.vertices {
            if let Some(size) = gradient {
                // Premultiplied white (including feathered edges) has r == a.
                if vertex.color.r() == vertex.color.a() {
                    let alpha = vertex.color.a() as f32 / 255.0;
                    vertex.color = gold_at(vertex.pos, size).gamma_multiply(alpha);
                }
            }
            let (x, y) = transform.project(vertex.pos.x, vertex.pos.y);
            vertex.pos = center + Vec2::new(x, y);
        }
        painter.add(Shape::mesh(mesh));
    }
}
