//! Patient data input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{PatientFeatures, N_FEATURES};
use crate::tui::styles::MedicalTheme;

/// How a field is edited and checked.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Whole number typed or stepped by 1
    Integer { min: f64, max: f64 },
    /// Decimal typed or stepped by `step`
    Decimal { min: f64, max: f64, step: f64 },
    /// One of a fixed set of codes, cycled with Left/Right
    Choice {
        options: &'static [(f64, &'static str)],
    },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub default: &'static str,
    pub value: String,
}

impl FormField {
    fn new(
        label: &'static str,
        hint: &'static str,
        kind: FieldKind,
        default: &'static str,
    ) -> Self {
        Self {
            label,
            hint,
            kind,
            default,
            value: default.to_string(),
        }
    }

    fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice { .. })
    }

    /// Value as shown in the form, with the meaning of categorical codes.
    #[must_use]
    pub fn display_value(&self) -> String {
        match self.kind {
            FieldKind::Choice { options } => self
                .value
                .parse::<f64>()
                .ok()
                .and_then(|v| options.iter().find(|(code, _)| *code == v))
                .map_or_else(|| self.value.clone(), |(code, name)| format!("{code} - {name}")),
            _ => self.value.clone(),
        }
    }

    /// Parse and range-check the current value.
    fn parse(&self) -> Result<f64, String> {
        let value: f64 = self
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", self.label))?;
        if !value.is_finite() {
            return Err(format!("{}: Invalid number", self.label));
        }

        match self.kind {
            FieldKind::Integer { min, max } => {
                if value.fract() != 0.0 {
                    return Err(format!("{}: Must be a whole number", self.label));
                }
                check_range(self.label, value, min, max)?;
            }
            FieldKind::Decimal { min, max, .. } => check_range(self.label, value, min, max)?,
            FieldKind::Choice { options } => {
                if !options.iter().any(|(code, _)| *code == value) {
                    return Err(format!("{}: Not a valid option", self.label));
                }
            }
        }
        Ok(value)
    }

    /// Step the value up or down, or cycle a categorical field.
    fn step(&mut self, forward: bool) {
        let current = self
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .or_else(|| self.default.parse().ok())
            .unwrap_or_default();

        self.value = match self.kind {
            FieldKind::Integer { min, max } => {
                let next = if forward { current + 1.0 } else { current - 1.0 };
                format!("{}", next.round().clamp(min, max))
            }
            FieldKind::Decimal { min, max, step } => {
                let next = if forward { current + step } else { current - step };
                // Snap to one decimal to avoid accumulating float error.
                format!("{:.1}", ((next * 10.0).round() / 10.0).clamp(min, max))
            }
            FieldKind::Choice { options } => {
                let idx = options
                    .iter()
                    .position(|(code, _)| *code == current)
                    .unwrap_or(0);
                let next = if forward {
                    (idx + 1) % options.len()
                } else {
                    (idx + options.len() - 1) % options.len()
                };
                format!("{}", options[next].0)
            }
        };
    }
}

fn check_range(label: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("{label}: Value must be between {min} and {max}"));
    }
    Ok(())
}

const BINARY_SEX: &[(f64, &str)] = &[(0.0, "Female"), (1.0, "Male")];
const CHEST_PAIN: &[(f64, &str)] = &[
    (0.0, "Typical Angina"),
    (1.0, "Atypical"),
    (2.0, "Non-anginal"),
    (3.0, "Asymptomatic"),
];
const TRUE_FALSE: &[(f64, &str)] = &[(0.0, "False"), (1.0, "True")];
const YES_NO: &[(f64, &str)] = &[(0.0, "No"), (1.0, "Yes")];
const RESTING_ECG: &[(f64, &str)] = &[
    (0.0, "Normal"),
    (1.0, "ST-T abnormality"),
    (2.0, "LV hypertrophy"),
];
const ST_SLOPE: &[(f64, &str)] = &[(0.0, "Upsloping"), (1.0, "Flat"), (2.0, "Downsloping")];
const VESSELS: &[(f64, &str)] = &[(0.0, "0"), (1.0, "1"), (2.0, "2"), (3.0, "3"), (4.0, "4")];
const THAL: &[(f64, &str)] = &[(1.0, "Normal"), (2.0, "Fixed defect"), (3.0, "Reversible defect")];

/// Column groups as `(title, number of fields)`, in field order.
pub const FORM_GROUPS: [(&str, usize); 4] = [
    ("Patient Bio", 3),
    ("Patient Bio", 3),
    ("Clinical Tests", 3),
    ("Clinical Tests", 4),
];

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        use FieldKind::{Choice, Decimal, Integer};

        // Order must match FEATURE_NAMES.
        let fields = vec![
            FormField::new("Age", "years (1-120)", Integer { min: 1.0, max: 120.0 }, "50"),
            FormField::new("Sex", "0=female, 1=male", Choice { options: BINARY_SEX }, "0"),
            FormField::new("Chest Pain Type (CP)", "0-3", Choice { options: CHEST_PAIN }, "0"),
            FormField::new(
                "Resting Blood Pressure",
                "mm Hg (80-200), normal < 120",
                Integer { min: 80.0, max: 200.0 },
                "120",
            ),
            FormField::new(
                "Serum Cholesterol",
                "mg/dl (100-600), normal < 200",
                Integer { min: 100.0, max: 600.0 },
                "200",
            ),
            FormField::new(
                "Fasting Blood Sugar > 120 mg/dl",
                "0/1",
                Choice { options: TRUE_FALSE },
                "0",
            ),
            FormField::new("Resting ECG Results", "0-2", Choice { options: RESTING_ECG }, "0"),
            FormField::new(
                "Max Heart Rate Achieved",
                "bpm (60-220)",
                Integer { min: 60.0, max: 220.0 },
                "150",
            ),
            FormField::new("Exercise Induced Angina", "0/1", Choice { options: YES_NO }, "0"),
            FormField::new(
                "ST Depression (Oldpeak)",
                "0.0-6.0, higher = higher risk",
                Decimal { min: 0.0, max: 6.0, step: 0.1 },
                "1.0",
            ),
            FormField::new(
                "ST Slope",
                "slope of peak exercise ST segment",
                Choice { options: ST_SLOPE },
                "0",
            ),
            FormField::new(
                "Major Vessels (CA)",
                "colored by fluoroscopy",
                Choice { options: VESSELS },
                "0",
            ),
            FormField::new("Thalassemia (Thal)", "1-3", Choice { options: THAL }, "1"),
        ];
        debug_assert_eq!(fields.len(), N_FEATURES);

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field. Categorical fields ignore typing.
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        if field.is_choice() {
            return;
        }
        if c.is_ascii_digit() || c == '.' {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.clear();
        }
    }

    /// Step the current field (Right/Left)
    pub fn step_field(&mut self, forward: bool) {
        self.fields[self.selected_field].step(forward);
        self.error_message = None;
    }

    /// Wipe all field buffers from memory and restore defaults.
    pub fn reset(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
            field.value.push_str(field.default);
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Wipe all field buffers without restoring defaults (used on exit).
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
    }

    /// Validate and convert to PatientFeatures
    pub fn to_patient_features(&self) -> Result<PatientFeatures, String> {
        let values = self
            .fields
            .iter()
            .map(FormField::parse)
            .collect::<Result<Vec<f64>, String>>()?;

        PatientFeatures::from_vec(&values)
    }
}

/// Render the patient data input form.
///
/// `load_error` is shown as a banner when the artifacts failed to load.
pub fn render_patient_form(
    f: &mut Frame,
    area: Rect,
    state: &PatientFormState,
    load_error: Option<&str>,
) {
    let banner_height = if load_error.is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(banner_height), // Load error
            Constraint::Min(0),                // Form
            Constraint::Length(3),             // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    if let Some(err) = load_error {
        render_load_error(f, chunks[1], err);
    }
    render_form_fields(f, chunks[2], state);
    render_form_footer(f, chunks[3], state, load_error.is_none());
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Heart Attack Risk Triage", MedicalTheme::title()),
        Span::styled(
            " │ Support Vector Machine classifier",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_load_error(f: &mut Frame, area: Rect, message: &str) {
    let banner = Paragraph::new(vec![
        Line::from(Span::styled(
            "Model or scaler artifacts could not be loaded. Submission is disabled.",
            MedicalTheme::danger(),
        )),
        Line::from(Span::styled(message.to_string(), MedicalTheme::text_secondary())),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(banner, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .margin(1)
        .split(area);

    let mut offset = 0;
    for (i, (title, count)) in FORM_GROUPS.iter().enumerate() {
        let end = (offset + count).min(state.fields.len());
        render_field_column(
            f,
            columns[i],
            title,
            &state.fields[offset..end],
            offset,
            state.selected_field,
        );
        offset = end;
    }
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    title: &str,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(1))
        .chain(fields.iter().map(|_| Constraint::Length(field_height)))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    f.render_widget(
        Paragraph::new(Span::styled(title.to_string(), MedicalTheme::subtitle())),
        chunks[0],
    );

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let border_style = if is_selected {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        };

        let title_style = if is_selected {
            MedicalTheme::focused()
        } else {
            MedicalTheme::text_secondary()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, MedicalTheme::text_muted())
        } else {
            Span::styled(field.display_value(), MedicalTheme::text())
        };

        let mut spans = vec![Span::raw(" ")];
        if is_selected && field.is_choice() {
            spans.push(Span::styled("◂ ", MedicalTheme::key_hint()));
        }
        spans.push(value_display);
        if is_selected {
            spans.push(if field.is_choice() {
                Span::styled(" ▸", MedicalTheme::key_hint())
            } else {
                Span::styled("▌", MedicalTheme::cursor())
            });
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i + 1]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState, can_submit: bool) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        let mut spans = vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Adjust ", MedicalTheme::key_desc()),
        ];
        if can_submit {
            spans.push(Span::styled("[Enter] ", MedicalTheme::key_hint()));
            spans.push(Span::styled("Generate Triage Report ", MedicalTheme::key_desc()));
        }
        spans.extend([
            Span::styled("[Ctrl+R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]);
        Line::from(spans)
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_to_valid_record() {
        let state = PatientFormState::default();
        let features = state.to_patient_features().expect("defaults parse");
        assert_eq!(features, PatientFeatures::default());
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_group_sizes_cover_all_fields() {
        let total: usize = FORM_GROUPS.iter().map(|(_, n)| n).sum();
        assert_eq!(total, N_FEATURES);
    }

    #[test]
    fn test_typing_replaces_numeric_value() {
        let mut state = PatientFormState::default();
        state.clear_field();
        for c in "67".chars() {
            state.input_char(c);
        }
        state.input_char('x');
        let features = state.to_patient_features().expect("parse");
        assert!((features.age - 67.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut state = PatientFormState::default();
        state.clear_field();
        for c in "121".chars() {
            state.input_char(c);
        }
        let err = state.to_patient_features().expect_err("must fail");
        assert!(err.starts_with("Age"));
    }

    #[test]
    fn test_empty_field_rejected() {
        let mut state = PatientFormState::default();
        state.selected_field = 4;
        state.clear_field();
        let err = state.to_patient_features().expect_err("must fail");
        assert!(err.contains("Serum Cholesterol"));
    }

    #[test]
    fn test_choice_fields_cycle_and_ignore_typing() {
        let mut state = PatientFormState::default();
        state.selected_field = 12; // thal: 1, 2, 3
        state.input_char('9');
        state.clear_field();
        assert_eq!(state.fields[12].value, "1");

        state.step_field(false);
        assert_eq!(state.fields[12].value, "3");
        state.step_field(true);
        state.step_field(true);
        assert_eq!(state.fields[12].value, "2");
        assert_eq!(state.fields[12].display_value(), "2 - Fixed defect");
    }

    #[test]
    fn test_decimal_step_clamps() {
        let mut state = PatientFormState::default();
        state.selected_field = 9; // oldpeak
        state.fields[9].value = "5.9".into();
        state.step_field(true);
        assert_eq!(state.fields[9].value, "6.0");
        state.step_field(true);
        assert_eq!(state.fields[9].value, "6.0");

        state.fields[9].value = "0.1".into();
        state.step_field(false);
        state.step_field(false);
        assert_eq!(state.fields[9].value, "0.0");
    }

    #[test]
    fn test_integer_step_from_empty_uses_default() {
        let mut state = PatientFormState::default();
        state.clear_field();
        state.step_field(true);
        assert_eq!(state.fields[0].value, "51");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = PatientFormState::default();
        state.fields[0].value = "99".into();
        state.selected_field = 5;
        state.error_message = Some("x".into());
        state.reset();
        assert_eq!(state.fields[0].value, "50");
        assert_eq!(state.selected_field, 0);
        assert!(state.error_message.is_none());
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = PatientFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, N_FEATURES - 1);
        state.next_field();
        assert_eq!(state.selected_field, 0);
    }
}
