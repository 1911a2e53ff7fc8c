//! Triage report view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::TriageReport;
use crate::tui::styles::MedicalTheme;

/// Report screen state
#[derive(Debug, Clone, Default)]
pub enum ReportState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Completed with result
    Complete { report: TriageReport },
    /// Pipeline failed
    Error { message: String },
}

/// Render the triage report
pub fn render_report(f: &mut Frame, area: Rect, state: &ReportState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_report_header(f, chunks[0]);
    match state {
        ReportState::Idle => render_idle(f, chunks[1]),
        ReportState::Complete { report } => render_result(f, chunks[1], report),
        ReportState::Error { message } => render_error(f, chunks[1], message),
    }
    render_report_footer(f, chunks[2]);
}

fn render_report_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Triage Report", MedicalTheme::title()),
        Span::styled(" │ Hyperplane distance analysis", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Enter patient data to generate a report",
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, report: &TriageReport) {
    let block = Block::default()
        .title(Span::styled(" Analysis Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Headline
            Constraint::Length(3), // Detail
            Constraint::Length(4), // Probability
            Constraint::Length(1), // Timestamp
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let risk_style = MedicalTheme::risk_label(report.label);

    let headline = Paragraph::new(Line::from(Span::styled(report.headline(), risk_style)))
        .alignment(Alignment::Center);
    f.render_widget(headline, chunks[0]);

    let detail = Paragraph::new(Line::from(Span::styled(report.detail(), MedicalTheme::text())))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(detail, chunks[1]);

    match report.progress_percent() {
        Some(percent) => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(Span::styled(
                            format!(" {} ", report.probability_line()),
                            MedicalTheme::text_secondary(),
                        ))
                        .borders(Borders::ALL)
                        .border_style(MedicalTheme::border()),
                )
                .gauge_style(MedicalTheme::info())
                .percent(percent)
                .label(format!("{percent}%"));
            f.render_widget(gauge, chunks[2]);
        }
        None => {
            let caption = Paragraph::new(Line::from(Span::styled(
                report.probability_line(),
                MedicalTheme::text_muted(),
            )))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(caption, chunks[2]);
        }
    }

    let stamp = Paragraph::new(Line::from(Span::styled(
        format!("Assessed {}", report.assessed_at.format("%Y-%m-%d %H:%M:%S UTC")),
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(stamp, chunks[3]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Analysis failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_report_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Esc/Enter] ", MedicalTheme::key_hint()),
        Span::styled("Back to Form ", MedicalTheme::key_desc()),
        Span::styled("[N] ", MedicalTheme::key_hint()),
        Span::styled("New Patient ", MedicalTheme::key_desc()),
        Span::styled("[Ctrl+Q] ", MedicalTheme::key_hint()),
        Span::styled("Quit", MedicalTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
