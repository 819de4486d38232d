// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Alumni details form.
//!
//! This module draws the intake form: text inputs, the branch drop-down,
//! the photo picker/drop zone, inline validation messages, and the QR
//! reveal. It never changes state itself; user intent is returned as
//! [`FormAction`]s for the application to apply.

use crate::models::intake::{IntakeController, Phase};
use crate::models::record::Field;
use std::path::PathBuf;

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
const FORM_WIDTH: f32 = 420.0;

/// Something the user asked the form to do.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    UpdateField(Field, String),
    PickPhoto,
    DropPhoto(PathBuf),
    Submit,
    RetryEncoding,
    ProceedToCard,
}

/// Read-only inputs for drawing the form.
pub struct FormView<'a> {
    pub controller: &'a IntakeController,
    pub photo_texture: Option<&'a egui::TextureHandle>,
    pub qr_texture: Option<&'a egui::TextureHandle>,
    /// Rotation of the QR image during its reveal, in degrees.
    pub qr_rotation_deg: f32,
    pub loading_photo: bool,
    /// Seconds since the form was opened.
    pub age: f32,
}

/// Ease-out cubic on 0.0..=1.0.
fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Entrance fade/slide: (opacity, vertical offset) for the given age.
pub fn entrance(age: f32) -> (f32, f32) {
    let t = ease_out(age / 0.6);
    (t, (1.0 - t) * 30.0)
}

/// Display the form and collect user actions.
pub fn show(ui: &mut egui::Ui, view: &FormView) -> Vec<FormAction> {
    let mut actions = Vec::new();
    let (opacity, offset) = entrance(view.age);

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0 + offset);
            ui.set_opacity(opacity);

            egui::Frame::group(ui.style())
                .fill(ui.visuals().panel_fill)
                .rounding(8.0)
                .inner_margin(24.0)
                .show(ui, |ui| {
                    ui.set_width(FORM_WIDTH);
                    show_fields(ui, view, &mut actions);
                    ui.add_space(12.0);
                    show_submit(ui, view, &mut actions);
                    show_result(ui, view, &mut actions);
                });
        });
    });

    actions
}

fn show_fields(ui: &mut egui::Ui, view: &FormView, actions: &mut Vec<FormAction>) {
    let controller = view.controller;
    let draft = controller.draft();
    let errors = controller.errors();

    ui.heading(
        egui::RichText::new("Fill out this form to generate your personalized Alumni Card!")
            .strong(),
    );
    ui.add_space(12.0);

    ui.vertical(|ui| {
        // Name
        ui.label(Field::Name.label());
        let mut name = draft.name.clone();
        if ui
            .add(egui::TextEdit::singleline(&mut name).desired_width(f32::INFINITY))
            .changed()
        {
            actions.push(FormAction::UpdateField(Field::Name, name));
        }
        show_error(ui, errors.get(Field::Name));

        // Batch
        ui.add_space(6.0);
        ui.label(Field::Batch.label());
        let mut batch = draft.batch.clone();
        let hint = format!(
            "{} - {}",
            controller.rules().earliest_batch,
            controller.rules().latest_batch(controller.current_year())
        );
        if ui
            .add(
                egui::TextEdit::singleline(&mut batch)
                    .hint_text(hint)
                    .desired_width(f32::INFINITY),
            )
            .changed()
        {
            actions.push(FormAction::UpdateField(Field::Batch, batch));
        }
        show_error(ui, errors.get(Field::Batch));

        // Branch drop-down; the combo box closes itself on outside clicks.
        ui.add_space(6.0);
        ui.label(Field::Branch.label());
        let selected = if draft.branch.is_empty() {
            "Select your branch"
        } else {
            draft.branch.as_str()
        };
        egui::ComboBox::from_id_source("branch")
            .selected_text(selected)
            .width(FORM_WIDTH)
            .show_ui(ui, |ui| {
                for branch in &controller.rules().branches {
                    if ui.selectable_label(draft.branch == *branch, branch.as_str()).clicked() {
                        actions.push(FormAction::UpdateField(Field::Branch, branch.clone()));
                    }
                }
            });
        show_error(ui, errors.get(Field::Branch));

        // Photo
        ui.add_space(6.0);
        let label = if controller.rules().photo_required {
            "Photo"
        } else {
            "Photo (optional)"
        };
        ui.label(label);
        show_photo(ui, view, actions);

        let mut url = draft.photo_url.clone();
        if ui
            .add(
                egui::TextEdit::singleline(&mut url)
                    .hint_text("or paste a photo URL")
                    .desired_width(f32::INFINITY),
            )
            .changed()
        {
            actions.push(FormAction::UpdateField(Field::Photo, url));
        }
        show_error(ui, errors.get(Field::Photo));
    });
}

fn show_photo(ui: &mut egui::Ui, view: &FormView, actions: &mut Vec<FormAction>) {
    let dragging_file = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
    let stroke = if dragging_file {
        egui::Stroke::new(2.0, ui.visuals().selection.bg_fill)
    } else {
        ui.visuals().widgets.noninteractive.bg_stroke
    };

    egui::Frame::none()
        .stroke(stroke)
        .rounding(6.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                if let Some(texture) = view.photo_texture {
                    ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(56.0, 64.0)));
                }
                ui.vertical(|ui| {
                    if ui.button("Choose photo...").clicked() {
                        actions.push(FormAction::PickPhoto);
                    }
                    if view.loading_photo {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading photo...");
                        });
                    } else {
                        ui.label(egui::RichText::new("or drop an image here").italics().weak());
                    }
                });
            });
        });

    let dropped = ui.ctx().input(|i| {
        i.raw
            .dropped_files
            .iter()
            .find_map(|f| f.path.clone())
    });
    if let Some(path) = dropped {
        actions.push(FormAction::DropPhoto(path));
    }
}

fn show_submit(ui: &mut egui::Ui, view: &FormView, actions: &mut Vec<FormAction>) {
    let button = egui::Button::new(
        egui::RichText::new("Generate QR")
            .color(egui::Color32::WHITE)
            .strong(),
    )
    .fill(egui::Color32::from_rgb(37, 99, 235))
    .min_size(egui::vec2(FORM_WIDTH, 34.0));

    if ui.add_enabled(view.controller.can_submit(), button).clicked() {
        actions.push(FormAction::Submit);
    }
}

fn show_result(ui: &mut egui::Ui, view: &FormView, actions: &mut Vec<FormAction>) {
    let controller = view.controller;

    match controller.phase() {
        Phase::Editing => {}
        Phase::Encoding => {
            ui.add_space(16.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Generating QR code...");
            });
        }
        Phase::Failed(failure) => {
            ui.add_space(16.0);
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(254, 243, 199))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.colored_label(
                        egui::Color32::from_rgb(146, 64, 14),
                        format!("Could not generate the QR code: {}", failure),
                    );
                    if ui.button("Retry").clicked() {
                        actions.push(FormAction::RetryEncoding);
                    }
                });
        }
        Phase::Ready => {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("Your QR Code").size(18.0).strong());
                ui.add_space(8.0);
                if let Some(texture) = view.qr_texture {
                    ui.add(
                        egui::Image::new(texture)
                            .fit_to_exact_size(egui::vec2(200.0, 200.0))
                            .rotate(view.qr_rotation_deg.to_radians(), egui::Vec2::splat(0.5)),
                    );
                }
                if controller.draft_differs_from_submission() {
                    ui.label(
                        egui::RichText::new(
                            "The form changed since this QR was generated. Press Generate QR to update it.",
                        )
                        .italics()
                        .weak(),
                    );
                }
                ui.add_space(8.0);
                let button = egui::Button::new(
                    egui::RichText::new("See your Alumni Card").color(egui::Color32::WHITE),
                )
                .fill(egui::Color32::from_rgb(22, 163, 74))
                .min_size(egui::vec2(180.0, 32.0));
                if ui.add(button).clicked() {
                    actions.push(FormAction::ProceedToCard);
                }
            });
        }
    }
}

fn show_error(ui: &mut egui::Ui, message: Option<&str>) {
    if let Some(message) = message {
        ui.colored_label(ERROR_COLOR, message);
    }
}
