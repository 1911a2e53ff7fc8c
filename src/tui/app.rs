//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Running the triage pipeline on submit

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::artifacts::{ScalerArtifact, SvmClassifier, TriageArtifacts};
use crate::application::TriageService;
use crate::config::ArtifactSettings;

use super::ui::{
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
    report::{render_report, ReportState},
};

/// Service type used by the interactive application.
pub type SvmTriageService = TriageService<SvmClassifier, ScalerArtifact>;

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    PatientForm,
    Report,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    /// Triage service, or the reason the artifacts could not be loaded.
    service: Result<SvmTriageService, String>,

    patient_form_state: PatientFormState,
    report_state: ReportState,
}

impl App {
    /// Load artifacts and build the application.
    ///
    /// A load failure does not abort startup: the form is still shown with
    /// the error as a banner and submission disabled.
    #[must_use]
    pub fn new(settings: &ArtifactSettings) -> Self {
        let service = TriageArtifacts::load(settings)
            .map_err(crate::TriageError::from)
            .and_then(|artifacts| {
                if artifacts.verified {
                    tracing::info!("Artifact manifest verified");
                }
                TriageService::from_artifacts(&artifacts)
            })
            .map_err(|e| {
                tracing::error!(
                    dir = %settings.dir.display(),
                    "Failed to load triage artifacts: {e}"
                );
                e.to_string()
            });

        Self::with_service(service)
    }

    /// Create application with an already-built service (or load error).
    #[must_use]
    pub fn with_service(service: Result<SvmTriageService, String>) -> Self {
        if let Ok(svc) = &service {
            tracing::info!(
                probability = svc.supports_probability(),
                "Triage service ready"
            );
        }

        Self {
            screen: Screen::PatientForm,
            should_quit: false,
            service,
            patient_form_state: PatientFormState::default(),
            report_state: ReportState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.patient_form_state.clear_sensitive();
        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::PatientForm => render_patient_form(
                        f,
                        chunks[0],
                        &self.patient_form_state,
                        self.service.as_ref().err().map(String::as_str),
                    ),
                    Screen::Report => render_report(f, chunks[0], &self.report_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::PatientForm => self.handle_patient_form_key(key, modifiers),
            Screen::Report => self.handle_report_key(key),
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let form = &mut self.patient_form_state;
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => form.reset(),
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Right => form.step_field(true),
            KeyCode::Left => form.step_field(false),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Delete => form.clear_field(),
            KeyCode::Enter => self.submit_patient_form(),
            _ => {}
        }
    }

    fn handle_report_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => self.screen = Screen::PatientForm,
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.patient_form_state.reset();
                self.report_state = ReportState::Idle;
                self.screen = Screen::PatientForm;
            }
            _ => {}
        }
    }

    fn submit_patient_form(&mut self) {
        let service = match &self.service {
            Ok(service) => service,
            Err(_) => {
                self.patient_form_state.error_message =
                    Some("Artifacts not loaded; submission is disabled".to_string());
                return;
            }
        };

        let features = match self.patient_form_state.to_patient_features() {
            Ok(features) => features,
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
                return;
            }
        };

        if let Err(errors) = features.validate() {
            self.patient_form_state.error_message = Some(errors.join(", "));
            return;
        }

        // Single record against in-memory artifacts; fast enough to run inline.
        self.report_state = match service.assess(&features) {
            Ok(report) => ReportState::Complete { report },
            Err(e) => {
                tracing::error!("Triage failed: {e}");
                ReportState::Error {
                    message: e.to_string(),
                }
            }
        };
        self.screen = Screen::Report;
    }
}
