use capture::VideoFrame;
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use screening::{calculate_risk, RiskAssessment, RiskInputs};
use shared::domain::{
    ApoeStatus, ChatMessage, FamilyHistory, MessageSender, RequestId, Variant9p21,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, ChatOutcome, StoredSlot, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const TYPING_PLACEHOLDER: &str = "typing...";
const MALFORMED_REPLY_FALLBACK: &str =
    "I'm sorry, I couldn't process your request. Please try again later.";
const REQUEST_FAILED_FALLBACK: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";

const INVALID_FIELD_COLOR: egui::Color32 = egui::Color32::from_rgb(0xd8, 0x4a, 0x4a);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageView {
    Screening,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraUiState {
    Idle,
    AwaitingFrames,
    Previewing,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

/// One row of the conversation log. `pending` carries the submission id
/// while the row is still the typing placeholder.
struct ChatLogEntry {
    message: ChatMessage,
    pending: Option<RequestId>,
}

#[derive(Default)]
struct StoredResults {
    uploaded: Option<String>,
    captured: Option<String>,
}

/// The page controller. Owns every piece of state the three flows touch;
/// handlers mutate it directly instead of reaching for ambient globals.
pub struct PulseCheckApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    status: String,
    status_banner: Option<StatusBanner>,
    view: PageView,

    // media capture
    camera: CameraUiState,
    latest_frame: Option<VideoFrame>,
    preview_texture: Option<TextureHandle>,
    photo_download: Option<String>,

    // risk form
    family_history: FamilyHistory,
    apoe: ApoeStatus,
    variant_9p21: Variant9p21,
    genetic_score_input: String,
    assessment: Option<RiskAssessment>,
    scroll_to_assessment: bool,
    validation_alert: Option<String>,

    // chat widget
    chat_open: bool,
    chat_log: Vec<ChatLogEntry>,
    chat_input: String,
    chat_request_in_flight: Option<RequestId>,

    // results view
    results: StoredResults,
    uploaded_preview: Option<Result<TextureHandle, String>>,
    captured_preview: Option<Result<TextureHandle, String>>,
}

impl PulseCheckApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            status: "Starting backend worker...".to_string(),
            status_banner: None,
            view: PageView::Screening,
            camera: CameraUiState::Idle,
            latest_frame: None,
            preview_texture: None,
            photo_download: None,
            family_history: FamilyHistory::None,
            apoe: ApoeStatus::NonCarrier,
            variant_9p21: Variant9p21::Absent,
            genetic_score_input: String::new(),
            assessment: None,
            scroll_to_assessment: false,
            validation_alert: None,
            chat_open: false,
            chat_log: Vec::new(),
            chat_input: String::new(),
            chat_request_in_flight: None,
            results: StoredResults::default(),
            uploaded_preview: None,
            captured_preview: None,
        }
    }

    // ---- chat flow ----

    fn toggle_chat(&mut self) {
        self.chat_open = !self.chat_open;
    }

    fn chat_toggle_glyph(&self) -> &'static str {
        if self.chat_open {
            "−"
        } else {
            "+"
        }
    }

    /// Handles one activation of the send control. Empty input is a silent
    /// no-op; while a request is in flight the control is disabled, so a
    /// second submission cannot start.
    fn submit_chat_message(&mut self) {
        if self.chat_request_in_flight.is_some() {
            return;
        }
        let text = self.chat_input.trim().to_string();
        if text.is_empty() {
            return;
        }

        let request_id = RequestId::new();
        self.chat_log.push(ChatLogEntry {
            message: ChatMessage::user(text.clone()),
            pending: None,
        });
        self.chat_log.push(ChatLogEntry {
            message: ChatMessage::assistant(TYPING_PLACEHOLDER),
            pending: Some(request_id),
        });
        self.chat_input.clear();
        self.chat_request_in_flight = Some(request_id);

        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::SendChat { request_id, text },
            &mut self.status,
        );
        if !queued {
            self.apply_chat_outcome(request_id, ChatOutcome::RequestFailed);
        }
    }

    /// Resolves the typing placeholder for `request_id` into its terminal
    /// bot entry. Unknown ids are ignored.
    fn apply_chat_outcome(&mut self, request_id: RequestId, outcome: ChatOutcome) {
        if self.chat_request_in_flight == Some(request_id) {
            self.chat_request_in_flight = None;
        }
        let Some(entry) = self
            .chat_log
            .iter_mut()
            .find(|entry| entry.pending == Some(request_id))
        else {
            return;
        };
        entry.message.text = match outcome {
            ChatOutcome::Reply(reply) => reply,
            ChatOutcome::MalformedReply => MALFORMED_REPLY_FALLBACK.to_string(),
            ChatOutcome::RequestFailed => REQUEST_FAILED_FALLBACK.to_string(),
        };
        entry.message.sent_at = Utc::now();
        entry.pending = None;
    }

    // ---- risk flow ----

    /// Runs the predictor against the current form state. An out-of-range
    /// genetic score raises the blocking alert and computes nothing.
    fn predict_risk(&mut self) {
        let genetic_score = match screening::parse_genetic_score(&self.genetic_score_input) {
            Ok(value) => value,
            Err(err) => {
                self.validation_alert = Some(err.to_string());
                return;
            }
        };

        let inputs = RiskInputs {
            family_history: self.family_history,
            genetic_score,
            apoe: self.apoe,
            variant_9p21: self.variant_9p21,
        };
        self.assessment = Some(calculate_risk(&inputs));
        self.scroll_to_assessment = true;
    }

    // ---- capture flow ----

    fn start_camera(&mut self) {
        self.camera = CameraUiState::AwaitingFrames;
        dispatch_backend_command(&self.cmd_tx, BackendCommand::StartCamera, &mut self.status);
    }

    fn capture_photo(&mut self) {
        // Guarded by the disabled capture control, but never trust UI state
        // alone: without a ready frame there is nothing to capture.
        let Some(frame) = self.latest_frame.clone() else {
            return;
        };
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::CapturePhoto { frame },
            &mut self.status,
        );
    }

    fn handle_image_stored(&mut self, slot: StoredSlot, data_url: String) {
        match slot {
            StoredSlot::UploadedImage => {
                self.results.uploaded = Some(data_url);
                self.uploaded_preview = None;
            }
            StoredSlot::CapturedPhoto => {
                self.photo_download = Some(data_url.clone());
                self.results.captured = Some(data_url);
                self.captured_preview = None;
            }
        }
        self.navigate_to_results();
    }

    fn navigate_to_results(&mut self) {
        self.view = PageView::Results;
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::LoadStoredImages,
            &mut self.status,
        );
    }

    // ---- event intake ----

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::BackendReady => {
                    self.status = "Ready".to_string();
                }
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::CameraFrame(frame) => {
                    self.camera = CameraUiState::Previewing;
                    self.update_preview_texture(ctx, &frame);
                    self.latest_frame = Some(frame);
                }
                UiEvent::ImageStored { slot, data_url } => {
                    self.handle_image_stored(slot, data_url);
                }
                UiEvent::StoredImagesLoaded { uploaded, captured } => {
                    self.results = StoredResults { uploaded, captured };
                    self.uploaded_preview = None;
                    self.captured_preview = None;
                }
                UiEvent::PhotoSaved { path } => {
                    self.status = format!("Saved photo to {}", path.display());
                }
                UiEvent::ChatCompleted {
                    request_id,
                    outcome,
                } => {
                    self.apply_chat_outcome(request_id, outcome);
                }
                UiEvent::Error(err) => {
                    self.status = format!("{} error: {}", err_label(err.category()), err.message());
                    if matches!(
                        err.context(),
                        UiErrorContext::BackendStartup
                            | UiErrorContext::UploadImage
                            | UiErrorContext::CapturePhoto
                    ) {
                        self.status_banner = Some(StatusBanner {
                            message: err.message().to_string(),
                        });
                    }
                }
            }
        }
    }

    fn update_preview_texture(&mut self, ctx: &egui::Context, frame: &VideoFrame) {
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.rgba,
        );
        match &mut self.preview_texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.preview_texture =
                    Some(ctx.load_texture("camera_preview", color_image, egui::TextureOptions::LINEAR));
            }
        }
    }

    // ---- rendering ----

    fn show_validation_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.validation_alert.clone() else {
            return;
        };
        egui::Modal::new(egui::Id::new("risk_validation_alert")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.label(egui::RichText::new("Invalid input").strong());
            ui.add_space(6.0);
            ui.label(message);
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                self.validation_alert = None;
            }
        });
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("page_header").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("PulseCheck");
                ui.separator();
                if ui
                    .selectable_label(self.view == PageView::Screening, "Screening")
                    .clicked()
                {
                    self.view = PageView::Screening;
                }
                if ui
                    .selectable_label(self.view == PageView::Results, "Results")
                    .clicked()
                {
                    self.navigate_to_results();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(&self.status);
                });
            });
            ui.add_space(4.0);
        });

        if let Some(banner) = self.status_banner.clone() {
            egui::TopBottomPanel::top("status_banner").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(INVALID_FIELD_COLOR, &banner.message);
                    if ui.button("Dismiss").clicked() {
                        self.status_banner = None;
                    }
                });
            });
        }
    }

    fn show_screening_page(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("screening_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_capture_section(ui);
                    ui.add_space(16.0);
                    self.show_risk_section(ui);
                    ui.add_space(24.0);
                });
        });
    }

    fn show_capture_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Scan an ECG image");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            if ui.button("Upload image...").clicked() {
                if let Some(path) = rfd::FileDialog::new().pick_file() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::StoreUploadedImage { path },
                        &mut self.status,
                    );
                }
            }

            match self.camera {
                CameraUiState::Idle => {
                    if ui.button("Start scanner").clicked() {
                        self.start_camera();
                    }
                }
                CameraUiState::AwaitingFrames | CameraUiState::Previewing => {
                    let frame_ready = self.camera == CameraUiState::Previewing
                        && self.latest_frame.is_some();
                    if ui
                        .add_enabled(frame_ready, egui::Button::new("Capture photo"))
                        .clicked()
                    {
                        self.capture_photo();
                    }
                }
            }

            if let Some(data_url) = self.photo_download.clone() {
                if ui.button("Save photo...").clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::SavePhoto { data_url },
                        &mut self.status,
                    );
                }
            }
        });

        match self.camera {
            CameraUiState::Idle => {}
            CameraUiState::AwaitingFrames => {
                ui.add_space(6.0);
                ui.label("Waiting for the camera...");
            }
            CameraUiState::Previewing => {
                ui.add_space(6.0);
                if let Some(texture) = &self.preview_texture {
                    ui.add(
                        egui::Image::new((texture.id(), texture.size_vec2()))
                            .max_size(egui::vec2(480.0, 360.0)),
                    );
                }
            }
        }
    }

    fn show_risk_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Heart risk assessment");
        ui.add_space(4.0);

        egui::Grid::new("risk_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Family history");
                egui::ComboBox::from_id_salt("family_history")
                    .selected_text(self.family_history.label())
                    .show_ui(ui, |ui| {
                        for option in FamilyHistory::ALL {
                            ui.selectable_value(&mut self.family_history, option, option.label());
                        }
                    });
                ui.end_row();

                ui.label("Genetic risk score (0-100)");
                let field_valid =
                    screening::genetic_score_field_is_valid(&self.genetic_score_input);
                let mut edit = egui::TextEdit::singleline(&mut self.genetic_score_input)
                    .hint_text("optional, defaults to 0")
                    .desired_width(160.0);
                if !field_valid {
                    edit = edit.text_color(INVALID_FIELD_COLOR);
                }
                ui.add(edit);
                ui.end_row();

                ui.label("APOE status");
                egui::ComboBox::from_id_salt("apoe_status")
                    .selected_text(self.apoe.label())
                    .show_ui(ui, |ui| {
                        for option in ApoeStatus::ALL {
                            ui.selectable_value(&mut self.apoe, option, option.label());
                        }
                    });
                ui.end_row();

                ui.label("9p21 variant");
                egui::ComboBox::from_id_salt("variant_9p21")
                    .selected_text(self.variant_9p21.label())
                    .show_ui(ui, |ui| {
                        for option in Variant9p21::ALL {
                            ui.selectable_value(&mut self.variant_9p21, option, option.label());
                        }
                    });
                ui.end_row();
            });

        ui.add_space(8.0);
        if ui.button("Predict risk").clicked() {
            self.predict_risk();
        }

        if let Some(assessment) = self.assessment {
            ui.add_space(12.0);
            let panel = ui.group(|ui| {
                ui.set_min_width(360.0);
                ui.label(
                    egui::RichText::new(assessment.tier().label())
                        .strong()
                        .size(18.0),
                );
                ui.add_space(4.0);
                ui.add(
                    egui::ProgressBar::new(assessment.meter_fraction())
                        .text(format!("{:.1}", assessment.score())),
                );
                ui.add_space(4.0);
                ui.label(assessment.tier().recommendation());
            });
            if self.scroll_to_assessment {
                panel.response.scroll_to_me(Some(egui::Align::Center));
                self.scroll_to_assessment = false;
            }
        }
    }

    fn show_results_page(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("results_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("Scan results");
                    ui.add_space(8.0);

                    let uploaded = self.results.uploaded.clone();
                    show_stored_slot(
                        ui,
                        "Uploaded image",
                        uploaded.as_deref(),
                        &mut self.uploaded_preview,
                    );
                    ui.add_space(12.0);
                    let captured = self.results.captured.clone();
                    show_stored_slot(
                        ui,
                        "Captured photo",
                        captured.as_deref(),
                        &mut self.captured_preview,
                    );

                    ui.add_space(16.0);
                    if ui.button("Back to screening").clicked() {
                        self.view = PageView::Screening;
                    }
                });
        });
    }

    fn show_chat_widget(&mut self, ctx: &egui::Context) {
        egui::Window::new("assistant_widget")
            .title_bar(false)
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .resizable(false)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("PulseCheck Assistant").strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(self.chat_toggle_glyph()).clicked() {
                            self.toggle_chat();
                        }
                    });
                });

                if !self.chat_open {
                    return;
                }

                ui.separator();
                egui::ScrollArea::vertical()
                    .id_salt("chat_log_scroll")
                    .max_height(260.0)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if self.chat_log.is_empty() {
                            ui.weak("Ask a health question to get started.");
                        }
                        for entry in &self.chat_log {
                            let prefix = match entry.message.sender {
                                MessageSender::User => "You",
                                MessageSender::Assistant => "Assistant",
                            };
                            let mut text = egui::RichText::new(format!(
                                "{prefix}: {}",
                                entry.message.text
                            ));
                            if entry.pending.is_some() {
                                text = text.italics().weak();
                            }
                            ui.add(egui::Label::new(text).wrap());
                            ui.add_space(4.0);
                        }
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    let input = ui.add(
                        egui::TextEdit::singleline(&mut self.chat_input)
                            .id_salt("chat_input")
                            .hint_text("Ask a health question...")
                            .desired_width(220.0),
                    );
                    let enter_pressed = input.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let can_send = self.chat_request_in_flight.is_none();
                    let send_clicked = ui
                        .add_enabled(can_send, egui::Button::new("Send"))
                        .clicked();
                    if can_send && (enter_pressed || send_clicked) {
                        self.submit_chat_message();
                        input.request_focus();
                    }
                });
            });
    }
}

fn show_stored_slot(
    ui: &mut egui::Ui,
    title: &str,
    data_url: Option<&str>,
    preview: &mut Option<Result<TextureHandle, String>>,
) {
    ui.label(egui::RichText::new(title).strong());
    let Some(data_url) = data_url else {
        ui.weak("No image stored yet.");
        return;
    };

    let cached = preview.get_or_insert_with(|| decode_stored_texture(ui.ctx(), title, data_url));
    match cached {
        Ok(texture) => {
            ui.add(
                egui::Image::new((texture.id(), texture.size_vec2()))
                    .max_size(egui::vec2(480.0, 360.0)),
            );
        }
        Err(reason) => {
            ui.weak(format!("Stored file is not a previewable image ({reason})."));
        }
    }
}

fn decode_stored_texture(
    ctx: &egui::Context,
    name: &str,
    data_url: &str,
) -> Result<TextureHandle, String> {
    let (_mime_type, bytes) = capture::decode_data_url(data_url).map_err(|err| err.to_string())?;
    let decoded = image::load_from_memory(&bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        rgba.as_raw(),
    );
    Ok(ctx.load_texture(name.to_owned(), color_image, egui::TextureOptions::LINEAR))
}

impl eframe::App for PulseCheckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);
        self.show_header(ctx);

        match self.view {
            PageView::Screening => self.show_screening_page(ctx),
            PageView::Results => self.show_results_page(ctx),
        }

        self.show_chat_widget(ctx);
        self.show_validation_alert(ctx);

        if self.camera != CameraUiState::Idle {
            ctx.request_repaint_after(std::time::Duration::from_millis(33));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn test_app() -> (
        PulseCheckApp,
        Receiver<BackendCommand>,
        Sender<UiEvent>,
    ) {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
        let (ui_tx, ui_rx) = bounded::<UiEvent>(16);
        (PulseCheckApp::new(cmd_tx, ui_rx), cmd_rx, ui_tx)
    }

    fn pending_placeholder_id(app: &PulseCheckApp) -> RequestId {
        app.chat_log
            .iter()
            .find_map(|entry| entry.pending)
            .expect("typing placeholder present")
    }

    #[test]
    fn toggling_the_widget_twice_restores_state_and_glyph() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        assert!(!app.chat_open);
        assert_eq!(app.chat_toggle_glyph(), "+");

        app.toggle_chat();
        assert!(app.chat_open);
        assert_eq!(app.chat_toggle_glyph(), "−");

        app.toggle_chat();
        assert!(!app.chat_open);
        assert_eq!(app.chat_toggle_glyph(), "+");
    }

    #[test]
    fn whitespace_only_submission_is_a_silent_no_op() {
        let (mut app, cmd_rx, _ui_tx) = test_app();
        app.chat_input = "   \t ".to_string();

        app.submit_chat_message();

        assert!(app.chat_log.is_empty());
        assert!(app.chat_request_in_flight.is_none());
        assert!(cmd_rx.try_recv().is_err(), "no command may be issued");
    }

    #[test]
    fn submission_appends_user_entry_and_typing_placeholder() {
        let (mut app, cmd_rx, _ui_tx) = test_app();
        app.chat_input = "  is sleep important?  ".to_string();

        app.submit_chat_message();

        assert_eq!(app.chat_log.len(), 2);
        assert_eq!(app.chat_log[0].message.sender, MessageSender::User);
        assert_eq!(app.chat_log[0].message.text, "is sleep important?");
        assert!(app.chat_log[0].pending.is_none());
        assert_eq!(app.chat_log[1].message.sender, MessageSender::Assistant);
        assert_eq!(app.chat_log[1].message.text, TYPING_PLACEHOLDER);
        assert!(app.chat_log[1].pending.is_some());
        assert!(app.chat_input.is_empty());
        assert!(app.chat_request_in_flight.is_some());

        match cmd_rx.try_recv().expect("send command queued") {
            BackendCommand::SendChat { request_id, text } => {
                assert_eq!(text, "is sleep important?");
                assert_eq!(Some(request_id), app.chat_request_in_flight);
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn second_submission_while_in_flight_is_rejected() {
        let (mut app, cmd_rx, _ui_tx) = test_app();
        app.chat_input = "first".to_string();
        app.submit_chat_message();
        let _ = cmd_rx.try_recv().expect("first command");

        app.chat_input = "second".to_string();
        app.submit_chat_message();

        assert_eq!(app.chat_log.len(), 2, "no new entries while pending");
        assert_eq!(app.chat_input, "second", "input left untouched");
        assert!(cmd_rx.try_recv().is_err(), "no second request issued");
    }

    #[test]
    fn reply_resolves_the_placeholder_into_one_terminal_bot_entry() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.chat_input = "hello".to_string();
        app.submit_chat_message();
        let request_id = pending_placeholder_id(&app);

        app.apply_chat_outcome(request_id, ChatOutcome::Reply("hi there".to_string()));

        assert_eq!(app.chat_log.len(), 2);
        assert_eq!(app.chat_log[1].message.text, "hi there");
        assert!(app.chat_log[1].pending.is_none());
        assert!(app.chat_request_in_flight.is_none());

        let bot_entries = app
            .chat_log
            .iter()
            .filter(|entry| entry.message.sender == MessageSender::Assistant)
            .count();
        assert_eq!(bot_entries, 1);
    }

    #[test]
    fn malformed_and_failed_outcomes_use_distinct_fallback_copy() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.chat_input = "first".to_string();
        app.submit_chat_message();
        let first_id = pending_placeholder_id(&app);
        app.apply_chat_outcome(first_id, ChatOutcome::MalformedReply);

        app.chat_input = "second".to_string();
        app.submit_chat_message();
        let second_id = pending_placeholder_id(&app);
        app.apply_chat_outcome(second_id, ChatOutcome::RequestFailed);

        assert_eq!(app.chat_log[1].message.text, MALFORMED_REPLY_FALLBACK);
        assert_eq!(app.chat_log[3].message.text, REQUEST_FAILED_FALLBACK);
        assert_ne!(MALFORMED_REPLY_FALLBACK, REQUEST_FAILED_FALLBACK);
    }

    #[test]
    fn stale_completion_for_unknown_request_changes_nothing() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.chat_input = "hello".to_string();
        app.submit_chat_message();

        app.apply_chat_outcome(RequestId::new(), ChatOutcome::Reply("stray".to_string()));

        assert_eq!(app.chat_log[1].message.text, TYPING_PLACEHOLDER);
        assert!(app.chat_log[1].pending.is_some());
    }

    #[test]
    fn dropped_dispatch_resolves_the_placeholder_with_failure_copy() {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
        let (_ui_tx, ui_rx) = bounded::<UiEvent>(16);
        drop(cmd_rx);
        let mut app = PulseCheckApp::new(cmd_tx, ui_rx);

        app.chat_input = "hello".to_string();
        app.submit_chat_message();

        assert_eq!(app.chat_log.len(), 2);
        assert_eq!(app.chat_log[1].message.text, REQUEST_FAILED_FALLBACK);
        assert!(app.chat_log[1].pending.is_none());
        assert!(app.chat_request_in_flight.is_none());
    }

    #[test]
    fn out_of_range_genetic_score_raises_the_alert_and_skips_scoring() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.genetic_score_input = "150".to_string();

        app.predict_risk();

        assert!(app.validation_alert.is_some());
        assert!(app.assessment.is_none());
    }

    #[test]
    fn empty_genetic_score_scores_with_the_other_fields_only() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.family_history = FamilyHistory::OneParent;
        app.apoe = ApoeStatus::OneE4Allele;
        app.variant_9p21 = Variant9p21::Present;
        app.genetic_score_input = String::new();

        app.predict_risk();

        let assessment = app.assessment.expect("assessment computed");
        assert_eq!(assessment.score(), 32.5);
        assert!(app.validation_alert.is_none());
    }

    #[test]
    fn worked_example_renders_moderate_with_one_decimal_score() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.family_history = FamilyHistory::OneParent;
        app.apoe = ApoeStatus::OneE4Allele;
        app.variant_9p21 = Variant9p21::Present;
        app.genetic_score_input = "40".to_string();

        app.predict_risk();

        let assessment = app.assessment.expect("assessment computed");
        assert_eq!(format!("{:.1}", assessment.score()), "52.5");
        assert_eq!(assessment.tier().label(), "Moderate Risk");
        assert!(app.scroll_to_assessment);
    }

    #[test]
    fn a_new_prediction_replaces_the_previous_assessment() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.genetic_score_input = "10".to_string();
        app.predict_risk();
        let first = app.assessment.expect("first assessment");

        app.genetic_score_input = "100".to_string();
        app.predict_risk();
        let second = app.assessment.expect("second assessment");

        assert_ne!(first.score(), second.score());
    }

    #[test]
    fn capture_with_no_ready_frame_is_prevented() {
        let (mut app, cmd_rx, _ui_tx) = test_app();
        app.camera = CameraUiState::Previewing;
        app.latest_frame = None;

        app.capture_photo();

        assert!(cmd_rx.try_recv().is_err(), "no capture command issued");
    }

    #[test]
    fn stored_capture_reveals_the_download_affordance_and_navigates() {
        let (mut app, cmd_rx, _ui_tx) = test_app();
        assert!(app.photo_download.is_none());

        app.handle_image_stored(
            StoredSlot::CapturedPhoto,
            "data:image/png;base64,AAAA".to_string(),
        );

        assert_eq!(app.photo_download.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(app.view, PageView::Results);
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(BackendCommand::LoadStoredImages)
        ));
    }

    #[test]
    fn a_new_capture_overwrites_the_download_target() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.handle_image_stored(
            StoredSlot::CapturedPhoto,
            "data:image/png;base64,Zmlyc3Q=".to_string(),
        );
        app.handle_image_stored(
            StoredSlot::CapturedPhoto,
            "data:image/png;base64,c2Vjb25k".to_string(),
        );

        assert_eq!(
            app.photo_download.as_deref(),
            Some("data:image/png;base64,c2Vjb25k")
        );
    }

    #[test]
    fn uploaded_image_navigates_without_creating_a_download_affordance() {
        let (mut app, _cmd_rx, _ui_tx) = test_app();
        app.handle_image_stored(
            StoredSlot::UploadedImage,
            "data:image/jpeg;base64,AAAA".to_string(),
        );

        assert_eq!(app.view, PageView::Results);
        assert!(app.photo_download.is_none());
    }
}
