mod config;
mod contact;
mod credential;
mod gemini;
mod normalize;
mod picture;
mod prompt;
mod session;

use iced::{
    alignment, clipboard,
    event::{self, Event as IcedEvent},
    keyboard::{self, Key},
    task::Handle,
    time,
    widget::{button, center, column, container, opaque, row, scrollable, stack, text, text_input},
    window, Color, Element, Font, Length, Padding, Subscription, Task, Theme,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use credential::{CredentialManager, Validity};
use gemini::GeminiClient;
use picture::Picture;
use session::{Session, Status};

const SPLASH_DURATION: Duration = Duration::from_millis(2500);
const COPY_NOTICE_DURATION: Duration = Duration::from_secs(2);
const WECHAT_JUMP_DELAY: Duration = Duration::from_millis(1500);
const WECHAT_NOTICE_DURATION: Duration = Duration::from_secs(3);
const QQ_FALLBACK_DELAY: Duration = Duration::from_millis(500);

fn main() -> iced::Result {
    let config = config::Config::load();

    iced::application("RePrompt", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(App::new)
}

#[derive(Debug, Clone)]
enum Message {
    SplashDone,
    CloseInstructions,
    OpenSettings,
    CloseSettings,
    EscapePressed,
    CredentialEdited(String),
    ProbeFinished(Validity),
    PickImage,
    FilePicked(Option<PathBuf>),
    PictureLoaded(Result<(Picture, Vec<u8>), String>),
    RemoteFinished(Result<String, String>),
    InstructionChanged(String),
    TargetLengthChanged(String),
    SubmitModify,
    Translate,
    ToggleBeautify,
    CopyResult,
    CopyNoticeExpired,
    Reset,
    ContactQq,
    QqFallback,
    ContactWechat,
    WechatJump,
    WechatNoticeExpired,
    FocusChanged(bool),
    Tick,
}

struct App {
    session: Session,
    client: Arc<GeminiClient>,
    shared_key: String,
    credentials: CredentialManager,
    probe_handle: Option<Handle>,
    preview: Option<iced::widget::image::Handle>,
    beautified: bool,
    show_splash: bool,
    show_instructions: bool,
    show_settings: bool,
    copy_notice: bool,
    wechat_notice: bool,
    window_focused: bool,
    load_error: Option<String>,
    loading_frame: usize,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = config::Config::load();

        let client = Arc::new(GeminiClient::new(config.gemini.model.clone()));
        let shared_key = config.shared_key();
        let credentials = CredentialManager::load();

        let mut app = App {
            session: Session::new(),
            client,
            shared_key,
            credentials,
            probe_handle: None,
            preview: None,
            beautified: true,
            show_splash: true,
            show_instructions: false,
            show_settings: false,
            copy_notice: false,
            wechat_notice: false,
            window_focused: true,
            load_error: None,
            loading_frame: 0,
        };

        let splash = Task::perform(sleep(SPLASH_DURATION), |_| Message::SplashDone);
        let probe = if app.credentials.is_custom() {
            app.schedule_probe()
        } else {
            Task::none()
        };

        (app, Task::batch([splash, probe]))
    }

    /// Aborts any pending probe and schedules a fresh one for the current
    /// key after the debounce delay, so only the newest edit is ever probed.
    fn schedule_probe(&mut self) -> Task<Message> {
        if let Some(handle) = self.probe_handle.take() {
            handle.abort();
        }

        let client = self.client.clone();
        let candidate = self.credentials.value().to_string();
        let (task, handle) = Task::future(async move {
            sleep(credential::DEBOUNCE).await;
            Message::ProbeFinished(client.probe(&candidate).await)
        })
        .abortable();

        self.probe_handle = Some(handle);
        task
    }

    /// The key actually sent with requests: the custom key when one is
    /// configured, the built-in shared key otherwise.
    fn effective_key(&self) -> String {
        if self.credentials.is_custom() {
            self.credentials.value().to_string()
        } else {
            self.shared_key.clone()
        }
    }

    fn spawn_text_generation(&self, prompt: String) -> Task<Message> {
        let client = self.client.clone();
        let key = self.effective_key();
        Task::future(async move {
            let result = client.generate_from_text(&prompt, &key).await;
            Message::RemoteFinished(
                result
                    .map(|text| normalize::normalize(&text))
                    .map_err(|e| e.to_string()),
            )
        })
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SplashDone => {
                self.show_splash = false;
                self.show_instructions = true;
                Task::none()
            }
            Message::CloseInstructions => {
                self.show_instructions = false;
                Task::none()
            }
            Message::OpenSettings => {
                self.show_settings = true;
                Task::none()
            }
            Message::CloseSettings => {
                self.show_settings = false;
                Task::none()
            }
            Message::EscapePressed => {
                if self.show_settings {
                    self.show_settings = false;
                } else if self.show_instructions {
                    self.show_instructions = false;
                }
                Task::none()
            }
            Message::CredentialEdited(value) => {
                if self.credentials.set(value) {
                    if let Err(e) = credential::store(self.credentials.value()) {
                        eprintln!("Error persisting API key: {}", e);
                    }
                    self.schedule_probe()
                } else {
                    if let Some(handle) = self.probe_handle.take() {
                        handle.abort();
                    }
                    credential::clear_stored();
                    Task::none()
                }
            }
            Message::ProbeFinished(validity) => {
                self.credentials.apply_probe(validity);
                self.probe_handle = None;
                Task::none()
            }
            Message::PickImage => {
                self.load_error = None;
                Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp", "gif"])
                            .pick_file()
                            .await
                            .map(|file| file.path().to_path_buf())
                    },
                    Message::FilePicked,
                )
            }
            Message::FilePicked(None) => Task::none(),
            Message::FilePicked(Some(path)) => Task::perform(
                async move {
                    match tokio::task::spawn_blocking(move || picture::load_picture(&path)).await {
                        Ok(Ok(loaded)) => Ok(loaded),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(e) => Err(e.to_string()),
                    }
                },
                Message::PictureLoaded,
            ),
            Message::PictureLoaded(Err(message)) => {
                self.load_error = Some(message);
                Task::none()
            }
            Message::PictureLoaded(Ok((picture, bytes))) => {
                if !self.session.begin_analysis(picture) {
                    return Task::none();
                }
                self.preview = Some(iced::widget::image::Handle::from_bytes(bytes));

                let Some(picture) = self.session.picture().cloned() else {
                    return Task::none();
                };
                let client = self.client.clone();
                let key = self.effective_key();
                Task::future(async move {
                    let result = client
                        .generate_from_image(
                            &picture.base64,
                            picture.mime_type,
                            prompt::ANALYZE_INSTRUCTIONS,
                            &key,
                        )
                        .await;
                    Message::RemoteFinished(
                        result
                            .map(|text| normalize::normalize(&text))
                            .map_err(|e| e.to_string()),
                    )
                })
            }
            Message::RemoteFinished(Ok(text)) => {
                self.session.complete(text);
                Task::none()
            }
            Message::RemoteFinished(Err(message)) => {
                self.session.fail(message);
                Task::none()
            }
            Message::InstructionChanged(value) => {
                self.session.set_instruction(value);
                Task::none()
            }
            Message::TargetLengthChanged(value) => {
                let digits: String = value.chars().filter(char::is_ascii_digit).collect();
                self.session.set_target_length_input(digits);
                Task::none()
            }
            Message::SubmitModify => {
                if !self.session.can_modify() {
                    return Task::none();
                }
                let prompt = prompt::modify_prompt(
                    self.session.result_text(),
                    self.session.instruction(),
                    self.session.target_length(),
                );
                if !self.session.begin_modify() {
                    return Task::none();
                }
                self.spawn_text_generation(prompt)
            }
            Message::Translate => {
                let Some(target) = self.session.begin_translate() else {
                    return Task::none();
                };
                let prompt = prompt::translate_prompt(self.session.result_text(), target);
                self.spawn_text_generation(prompt)
            }
            Message::ToggleBeautify => {
                self.beautified = !self.beautified;
                Task::none()
            }
            Message::CopyResult => {
                if self.session.result_text().is_empty() {
                    return Task::none();
                }
                let payload = if self.beautified {
                    normalize::pretty(self.session.result_text())
                } else {
                    self.session.result_text().to_string()
                };
                self.copy_notice = true;
                Task::batch([
                    clipboard::write(payload),
                    Task::perform(sleep(COPY_NOTICE_DURATION), |_| Message::CopyNoticeExpired),
                ])
            }
            Message::CopyNoticeExpired => {
                self.copy_notice = false;
                Task::none()
            }
            Message::Reset => {
                if self.session.reset() {
                    self.preview = None;
                    self.load_error = None;
                }
                Task::none()
            }
            Message::ContactQq => {
                contact::open_uri(&contact::qq_chat_uri());
                Task::perform(sleep(QQ_FALLBACK_DELAY), |_| Message::QqFallback)
            }
            Message::QqFallback => {
                if self.window_focused {
                    contact::open_uri(&contact::qq_fallback_uri());
                }
                Task::none()
            }
            Message::ContactWechat => {
                self.wechat_notice = true;
                Task::batch([
                    clipboard::write(contact::WECHAT_ID.to_string()),
                    Task::perform(sleep(WECHAT_JUMP_DELAY), |_| Message::WechatJump),
                ])
            }
            Message::WechatJump => {
                contact::open_uri(contact::WECHAT_URI);
                Task::perform(sleep(WECHAT_NOTICE_DURATION), |_| {
                    Message::WechatNoticeExpired
                })
            }
            Message::WechatNoticeExpired => {
                self.wechat_notice = false;
                Task::none()
            }
            Message::FocusChanged(focused) => {
                self.window_focused = focused;
                Task::none()
            }
            Message::Tick => {
                if self.session.is_busy() {
                    self.loading_frame = (self.loading_frame + 1) % 80; // 10 frames * 8 messages
                }
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.session.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| match event {
            IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) => Some(Message::EscapePressed),
            IcedEvent::Window(window::Event::Focused) => Some(Message::FocusChanged(true)),
            IcedEvent::Window(window::Event::Unfocused) => Some(Message::FocusChanged(false)),
            _ => None,
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        let page = column![self.header(), self.main_content(), self.footer()]
            .spacing(20)
            .padding(20)
            .width(Length::Fill);

        let mut screen: Element<Message> = scrollable(page).height(Length::Fill).into();

        if self.show_instructions {
            screen = modal(screen, self.instructions_modal());
        }
        if self.show_settings {
            screen = modal(screen, self.settings_modal());
        }
        if self.wechat_notice {
            screen = modal(screen, self.wechat_popup());
        }
        if self.show_splash {
            screen = splash_overlay(screen);
        }
        screen
    }

    fn header(&self) -> Element<Message> {
        let title = column![
            text("Image Reverse Prompt Helper").size(28),
            text("Turn any picture back into a structured JSON prompt").size(14),
        ]
        .spacing(5)
        .align_x(alignment::Horizontal::Center);

        row![
            container(title)
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
            button(text("[Settings]").size(14))
                .on_press(Message::OpenSettings)
                .padding(10),
        ]
        .align_y(alignment::Vertical::Center)
        .into()
    }

    fn main_content(&self) -> Element<Message> {
        let mut content = column![].spacing(20).width(Length::Fill);

        if let Some(handle) = &self.preview {
            content = content.push(
                container(iced::widget::image(handle.clone()).height(Length::Fixed(260.0)))
                    .width(Length::Fill)
                    .align_x(alignment::Horizontal::Center),
            );
        }

        let body: Element<Message> = match self.session.status() {
            Status::Idle => self.idle_view(),
            Status::Analyzing | Status::Modifying => self.loading_view(),
            Status::Success => self.success_view(),
            Status::Error => self.error_view(),
        };

        content.push(body).into()
    }

    fn idle_view(&self) -> Element<Message> {
        let upload = button(
            column![
                text("Click to upload an image").size(24),
                text("The analysis instructions are built in - upload and go!").size(14),
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center),
        )
        .on_press(Message::PickImage)
        .padding(40);

        let mut content = column![upload]
            .spacing(10)
            .align_x(alignment::Horizontal::Center);

        if let Some(error) = &self.load_error {
            content = content.push(text(format!("Could not load image: {}", error)).size(14).style(
                |theme: &Theme| text::Style {
                    color: Some(theme.palette().danger),
                },
            ));
        }

        container(content)
            .width(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .padding(Padding::from([40, 0]))
            .into()
    }

    fn loading_view(&self) -> Element<Message> {
        // Show animated loading text using unicode spinner
        let loading_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let loading_messages = [
            "Reading every pixel...",
            "Reverse-engineering the prompt...",
            "Cataloguing subjects and colors...",
            "Measuring the lighting...",
            "Sampling the textures...",
            "Sketching the layout...",
            "Distilling the style...",
            "Packing it all into JSON...",
        ];

        let message_idx = (self.loading_frame / 10) % loading_messages.len();
        let spinner_idx = self.loading_frame % loading_frames.len();

        container(
            column![
                text(loading_frames[spinner_idx]).size(32),
                text(loading_messages[message_idx]).size(15)
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center),
        )
        .width(Length::Fill)
        .padding(Padding::from([60, 0]))
        .align_x(alignment::Horizontal::Center)
        .into()
    }

    fn success_view(&self) -> Element<Message> {
        let display_json = if self.beautified {
            normalize::pretty(self.session.result_text())
        } else {
            self.session.result_text().to_string()
        };

        let translate_label = format!(
            "[Translate to {}]",
            self.session.language().toggled().english_name()
        );
        let beautify_label = if self.beautified {
            "[Beautified]"
        } else {
            "[Beautify JSON]"
        };

        let mut actions = row![
            button(text("[Copy Result]").size(14))
                .on_press(Message::CopyResult)
                .padding(10),
            button(text(translate_label).size(14))
                .on_press(Message::Translate)
                .padding(10),
            button(text(beautify_label).size(14))
                .on_press(Message::ToggleBeautify)
                .padding(10),
            button(text("[Re-upload]").size(14))
                .on_press(Message::Reset)
                .padding(10),
        ]
        .spacing(10)
        .align_y(alignment::Vertical::Center);

        if self.copy_notice {
            actions = actions.push(container(text("Copied!").size(14)).padding(10));
        }

        let json_panel = container(text(display_json).size(14))
            .padding(15)
            .width(Length::Fill)
            .style(container::rounded_box);

        let refine = column![
            text("Refine the result (JSON only)").size(16),
            row![
                text_input("e.g. remove all lighting fields...", self.session.instruction())
                    .on_input(Message::InstructionChanged)
                    .on_submit(Message::SubmitModify)
                    .padding(10)
                    .size(14),
                text_input("target count", self.session.target_length_input())
                    .on_input(Message::TargetLengthChanged)
                    .padding(10)
                    .size(14)
                    .width(Length::Fixed(140.0)),
                button(text("[Run]").size(14))
                    .on_press(Message::SubmitModify)
                    .padding(10),
            ]
            .spacing(10)
            .align_y(alignment::Vertical::Center),
            text("Tip: set a target count to paste straight into platforms with length limits.")
                .size(12),
        ]
        .spacing(10);

        column![actions, json_panel, refine].spacing(20).into()
    }

    fn error_view(&self) -> Element<Message> {
        let message = if self.session.last_error().is_empty() {
            "Something went wrong."
        } else {
            self.session.last_error()
        };

        container(
            column![
                text("Analysis failed").size(22),
                text(message).size(15).style(|theme: &Theme| text::Style {
                    color: Some(theme.palette().danger),
                }),
                text("Check your API key or try again.").size(13),
                button(text("[Back]").size(14))
                    .on_press(Message::Reset)
                    .padding(10),
            ]
            .spacing(12)
            .align_x(alignment::Horizontal::Center),
        )
        .width(Length::Fill)
        .padding(Padding::from([40, 0]))
        .align_x(alignment::Horizontal::Center)
        .into()
    }

    fn footer(&self) -> Element<Message> {
        container(
            row![
                button(text("[Contact via QQ]").size(14))
                    .on_press(Message::ContactQq)
                    .padding(12),
                button(text("[Contact via WeChat]").size(14))
                    .on_press(Message::ContactWechat)
                    .padding(12),
            ]
            .spacing(20),
        )
        .width(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .padding(Padding::from([20, 0]))
        .into()
    }

    fn instructions_modal(&self) -> Element<Message> {
        let notes = [
            "1. Images are parsed with a faithful one-to-one reading so no detail is missed.",
            "2. All common image formats are supported.",
            "3. Refine the parsed result freely; set a target word count for platforms with length limits.",
            "4. Ideas or feedback? Reach me through the buttons at the bottom.",
        ];

        let mut body = column![text("How to use").size(24)].spacing(15);
        for note in notes {
            body = body.push(text(note).size(14));
        }
        body = body.push(
            button(text("[Got it, let's go!]").size(16))
                .on_press(Message::CloseInstructions)
                .padding(12),
        );

        card(body.into())
    }

    fn settings_modal(&self) -> Element<Message> {
        let (indicator_color, caption) =
            match (self.credentials.is_custom(), self.credentials.validity()) {
                (true, Validity::Valid) => {
                    (Color::from_rgb(0.2, 0.8, 0.4), "Custom key verified")
                }
                (true, Validity::Invalid) => {
                    (Color::from_rgb(0.9, 0.3, 0.3), "Key validation failed")
                }
                _ => (
                    Color::from_rgb(0.6, 0.6, 0.6),
                    "Using the built-in shared key",
                ),
            };

        let indicator = text("●").size(14).style(move |_theme: &Theme| text::Style {
            color: Some(indicator_color),
        });

        let body = column![
            row![
                container(text("Settings").size(24)).width(Length::Fill),
                button(text("[X]").size(14))
                    .on_press(Message::CloseSettings)
                    .padding(8),
            ]
            .align_y(alignment::Vertical::Center),
            text("Gemini API key").size(16),
            text_input(
                "Leave empty to use the built-in shared key",
                self.credentials.value(),
            )
            .secure(true)
            .on_input(Message::CredentialEdited)
            .padding(10)
            .size(14),
            row![indicator, text(caption).size(13)]
                .spacing(8)
                .align_y(alignment::Vertical::Center),
            text("A shared key is built in for casual use. Paste a private key here if you need more headroom.")
                .size(13),
            button(text("[Save and close]").size(14))
                .on_press(Message::CloseSettings)
                .padding(10),
        ]
        .spacing(15);

        card(body.into())
    }

    fn wechat_popup(&self) -> Element<Message> {
        card(
            column![
                text("WeChat ID copied to your clipboard!").size(18),
                text("Opening WeChat...").size(14),
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center)
            .into(),
        )
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

fn card(content: Element<Message>) -> Element<Message> {
    container(content)
        .padding(25)
        .max_width(520)
        .style(container::rounded_box)
        .into()
}

fn modal<'a>(base: Element<'a, Message>, overlay: Element<'a, Message>) -> Element<'a, Message> {
    stack![
        base,
        opaque(
            center(opaque(overlay)).style(|_theme: &Theme| container::Style {
                background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.6).into()),
                ..container::Style::default()
            })
        )
    ]
    .into()
}

fn splash_overlay(base: Element<Message>) -> Element<Message> {
    let content = column![
        text("Image Reverse Prompt Helper").size(32),
        text("warming up the vision model...").size(14),
    ]
    .spacing(12)
    .align_x(alignment::Horizontal::Center);

    stack![
        base,
        opaque(center(content).style(|_theme: &Theme| container::Style {
            background: Some(Color::from_rgb(0.08, 0.08, 0.12).into()),
            ..container::Style::default()
        }))
    ]
    .into()
}
