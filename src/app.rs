// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the application structure that implements the
//! eframe::App trait. It owns the current view (the intake form or the
//! card), performs navigation between them, owns the GPU textures, and
//! applies the actions the UI components return.

use crate::config::AppConfig;
use crate::io::encoder::png_from_data_url;
use crate::io::media::{self, LoadedImage, PhotoResource};
use crate::models::handoff::HandoffPayload;
use crate::models::intake::IntakeController;
use crate::models::record::Field;
use crate::models::presentation::PresentationRenderer;
use crate::ui::{card, form};
use crate::util::spring::{Animated, Spring};
use std::sync::mpsc::Receiver;

/// Starting rotation of the QR image when it is revealed, in degrees.
const QR_REVEAL_FROM: f32 = -10.0;

/// Navigation targets.
#[derive(Debug, Clone)]
pub enum Route {
    Intake,
    /// The card view; `None` stands for opening it without data.
    Card(Option<HandoffPayload>),
}

/// A texture created from an image, remembered by the key it was made for.
struct KeyedTexture {
    key: String,
    handle: egui::TextureHandle,
}

/// Keep `slot` in step with the image named by `key`, building a new
/// texture only when the key changes.
fn sync_texture<F>(
    ctx: &egui::Context,
    slot: &mut Option<KeyedTexture>,
    name: &str,
    key: Option<&str>,
    image: F,
) where
    F: FnOnce() -> Option<egui::ColorImage>,
{
    let Some(key) = key else {
        if slot.take().is_some() {
            log::debug!("Dropped {} texture", name);
        }
        return;
    };
    if slot.as_ref().map(|t| t.key == key).unwrap_or(false) {
        return;
    }
    if let Some(image) = image() {
        let handle = ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
        *slot = Some(KeyedTexture {
            key: key.to_string(),
            handle,
        });
    }
}

/// The intake form and its view-only state.
struct IntakeView {
    controller: IntakeController,
    photo_loader: Option<Receiver<Result<PhotoResource, String>>>,
    photo_texture: Option<KeyedTexture>,
    qr_texture: Option<KeyedTexture>,
    qr_reveal: Animated,
    opened_at: Option<f64>,
}

impl IntakeView {
    fn new(config: &AppConfig) -> Self {
        Self {
            controller: IntakeController::new(config),
            photo_loader: None,
            photo_texture: None,
            qr_texture: None,
            qr_reveal: Animated::new(Spring::new(120.0, 12.0), 0.0),
            opened_at: None,
        }
    }

    fn load_photo(&mut self, path: std::path::PathBuf) {
        if !media::is_supported_image(&path) {
            self.controller
                .reject_photo(format!("{} is not a supported image", path.display()));
            return;
        }
        self.photo_loader = Some(media::spawn_load(path));
    }

    /// Collect background results and keep textures in step with state.
    fn poll(&mut self, ctx: &egui::Context) {
        if let Some(ref receiver) = self.photo_loader {
            if let Ok(result) = receiver.try_recv() {
                self.photo_loader = None;
                match result {
                    Ok(resource) => self.controller.select_photo(resource),
                    Err(e) => self.controller.reject_photo(format!("Could not read image: {}", e)),
                }
            }
        }

        if self.controller.poll_encoding() && self.controller.artifact().is_some() {
            self.qr_reveal.state.value = QR_REVEAL_FROM;
            self.qr_reveal.set_target(0.0);
        }

        let controller = &self.controller;
        sync_texture(
            ctx,
            &mut self.photo_texture,
            "photo_preview",
            controller.photo().map(|p| p.url()),
            || controller.photo().map(|p| p.image().to_color_image()),
        );
        sync_texture(
            ctx,
            &mut self.qr_texture,
            "qr_code",
            controller.artifact().map(|a| a.payload()),
            || {
                controller.artifact().map(|a| {
                    let (width, height) = a.size();
                    egui::ColorImage::from_rgba_unmultiplied(
                        [width as usize, height as usize],
                        a.pixels(),
                    )
                })
            },
        );
    }

    fn show(&mut self, ui: &mut egui::Ui) -> Option<Route> {
        let now = ui.input(|i| i.time);
        let age = (now - *self.opened_at.get_or_insert(now)) as f32;
        let dt = ui.input(|i| i.stable_dt).min(0.1);
        let rotation = self.qr_reveal.tick(dt);

        let busy = self.photo_loader.is_some() || !self.controller.can_submit();
        if busy || age < 0.6 || !self.qr_reveal.is_settled() {
            ui.ctx().request_repaint();
        }

        let view = form::FormView {
            controller: &self.controller,
            photo_texture: self.photo_texture.as_ref().map(|t| &t.handle),
            qr_texture: self.qr_texture.as_ref().map(|t| &t.handle),
            qr_rotation_deg: rotation,
            loading_photo: self.photo_loader.is_some(),
            age,
        };
        let actions = form::show(ui, &view);

        let mut route = None;
        for action in actions {
            if let Some(next) = self.apply(action) {
                route = Some(next);
            }
        }
        route
    }

    /// Apply one form action to the controller.
    fn apply(&mut self, action: form::FormAction) -> Option<Route> {
        match action {
            form::FormAction::UpdateField(field, value) => {
                if field == Field::Photo && self.photo_loader.take().is_some() {
                    log::debug!("Photo load superseded by typed URL");
                }
                self.controller.update_field(field, value);
            }
            form::FormAction::PickPhoto => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", &media::IMAGE_EXTENSIONS)
                    .pick_file()
                {
                    self.load_photo(path);
                }
            }
            form::FormAction::DropPhoto(path) => {
                log::info!("Photo dropped: {}", path.display());
                self.load_photo(path);
            }
            form::FormAction::Submit => {
                let _ = self.controller.submit();
            }
            form::FormAction::RetryEncoding => {
                self.controller.retry_encoding();
            }
            form::FormAction::ProceedToCard => {
                return Some(Route::Card(self.controller.proceed_to_presentation()));
            }
        }
        None
    }
}

/// The card and the images it shows.
struct CardView {
    renderer: PresentationRenderer,
    qr_image: Option<LoadedImage>,
    photo_image: Option<LoadedImage>,
    photo_loader: Option<Receiver<Result<PhotoResource, String>>>,
    qr_texture: Option<KeyedTexture>,
    photo_texture: Option<KeyedTexture>,
}

impl CardView {
    /// Build the card from the payload alone; nothing else crosses over
    /// from the form.
    fn new(renderer: PresentationRenderer) -> Self {
        let payload = renderer.payload();

        let qr_image = png_from_data_url(&payload.qr_url)
            .and_then(|png| media::load_png(&png))
            .map_err(|e| log::warn!("Could not decode QR image: {:#}", e))
            .ok();

        let photo_loader = media::path_from_url(&payload.photo_url).map(media::spawn_load);
        if photo_loader.is_none() && !payload.photo_url.trim().is_empty() {
            log::info!("Photo {} is not local, showing placeholder", payload.photo_url);
        }

        Self {
            renderer,
            qr_image,
            photo_image: None,
            photo_loader,
            qr_texture: None,
            photo_texture: None,
        }
    }

    fn show(&mut self, ui: &mut egui::Ui) -> Option<Route> {
        if let Some(ref receiver) = self.photo_loader {
            if let Ok(result) = receiver.try_recv() {
                self.photo_loader = None;
                match result {
                    Ok(resource) => self.photo_image = Some(resource.image),
                    Err(e) => log::warn!("Could not load card photo: {}", e),
                }
            } else {
                ui.ctx().request_repaint();
            }
        }

        let ctx = ui.ctx().clone();
        let payload = self.renderer.payload();
        let qr_image = &self.qr_image;
        sync_texture(
            &ctx,
            &mut self.qr_texture,
            "card_qr",
            qr_image.as_ref().map(|_| payload.qr_url.as_str()),
            || qr_image.as_ref().map(LoadedImage::to_color_image),
        );
        let photo_image = &self.photo_image;
        sync_texture(
            &ctx,
            &mut self.photo_texture,
            "card_photo",
            photo_image.as_ref().map(|_| payload.photo_url.as_str()),
            || photo_image.as_ref().map(LoadedImage::to_color_image),
        );

        let textures = card::CardTextures {
            photo: self.photo_texture.as_ref().map(|t| &t.handle),
            qr: self.qr_texture.as_ref().map(|t| &t.handle),
        };
        match card::show(ui, &mut self.renderer, &textures) {
            card::CardAction::BackToForm => Some(Route::Intake),
            card::CardAction::None => None,
        }
    }
}

enum View {
    Intake(Box<IntakeView>),
    Card(Box<CardView>),
}

/// Main application state.
pub struct AlumniCardApp {
    config: AppConfig,
    view: View,
}

impl AlumniCardApp {
    /// Create the application on the intake form.
    pub fn new(config: AppConfig) -> Self {
        let view = View::Intake(Box::new(IntakeView::new(&config)));
        Self { config, view }
    }

    /// Switch views. Opening the card without usable data lands on a
    /// fresh form instead.
    pub fn navigate(&mut self, route: Route) {
        self.view = match route {
            Route::Intake => {
                log::info!("Showing form");
                View::Intake(Box::new(IntakeView::new(&self.config)))
            }
            Route::Card(payload) => match PresentationRenderer::new(payload, &self.config.card) {
                Ok(renderer) => {
                    log::info!("Showing card for {:?}", renderer.payload().name);
                    View::Card(Box::new(CardView::new(renderer)))
                }
                Err(e) => {
                    log::debug!("Redirecting to form: {}", e);
                    View::Intake(Box::new(IntakeView::new(&self.config)))
                }
            },
        };
    }

    fn is_showing_card(&self) -> bool {
        matches!(self.view, View::Card(_))
    }

    /// Payload the card menu entry would open with.
    fn current_payload(&self) -> Option<HandoffPayload> {
        match &self.view {
            View::Intake(intake) => intake.controller.proceed_to_presentation(),
            View::Card(card) => Some(card.renderer.payload().clone()),
        }
    }
}

impl eframe::App for AlumniCardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let View::Intake(intake) = &mut self.view {
            intake.poll(ctx);
        }

        let mut route = None;

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Go", |ui| {
                    if ui.button("Form").clicked() {
                        route = Some(Route::Intake);
                        ui.close_menu();
                    }
                    if ui.button("Alumni Card").clicked() {
                        route = Some(Route::Card(self.current_payload()));
                        ui.close_menu();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let next = match &mut self.view {
                View::Intake(intake) => intake.show(ui),
                View::Card(card) => card.show(ui),
            };
            if route.is_none() {
                route = next;
            }
        });

        if let Some(route) = route {
            self.navigate(route);
            ctx.request_repaint();
        }
    }
}
