use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

// The server speaks Spanish on the wire; field names and enum values are
// renamed accordingly and must not change.

// ==========================================
// Auth
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellidos", default)]
    pub surname: Option<String>,
    pub email: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "empresa", default)]
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellidos")]
    pub surname: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "empresa")]
    pub company: String,
    pub password: String,
}

// ==========================================
// Clients
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum ClientKind {
    #[serde(rename = "particular")]
    Individual,
    #[serde(rename = "empresa")]
    Company,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Individual => "particular",
            ClientKind::Company => "empresa",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientKind::Individual => "Individual",
            ClientKind::Company => "Company",
        }
    }
}

impl Default for ClientKind {
    fn default() -> Self {
        ClientKind::Individual
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Client {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellidos", default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "telefono_secundario", default)]
    pub secondary_phone: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    #[serde(rename = "codigo_postal", default)]
    pub postal_code: Option<String>,
    #[serde(rename = "provincia", default)]
    pub province: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: ClientKind,
    #[serde(rename = "nif_cif", default)]
    pub tax_id: Option<String>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Client {
    pub fn full_name(&self) -> String {
        match self.surname.as_deref() {
            Some(s) if !s.is_empty() => format!("{} {}", self.name, s),
            _ => self.name.clone(),
        }
    }
}

/// Create/update payload for a client record. Blank optional fields are
/// sent as empty strings, which is what the server stores.
#[derive(Debug, Serialize, Default, Clone)]
pub struct ClientForm {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellidos")]
    pub surname: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "telefono_secundario")]
    pub secondary_phone: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "codigo_postal")]
    pub postal_code: String,
    #[serde(rename = "provincia")]
    pub province: String,
    #[serde(rename = "tipo")]
    pub kind: ClientKind,
    #[serde(rename = "nif_cif")]
    pub tax_id: String,
    #[serde(rename = "notas")]
    pub notes: String,
}

impl ClientForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        }
        if self.phone.trim().is_empty() {
            errors.push(FieldError::new("phone", "phone is required"));
        }
        errors
    }
}

// ==========================================
// Visits
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum VisitCategory {
    #[serde(rename = "valoracion")]
    Valuation,
    #[serde(rename = "reparacion")]
    Repair,
    #[serde(rename = "instalacion")]
    Installation,
    #[serde(rename = "mantenimiento")]
    Maintenance,
    #[serde(rename = "urgencia")]
    Urgent,
}

impl VisitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitCategory::Valuation => "valoracion",
            VisitCategory::Repair => "reparacion",
            VisitCategory::Installation => "instalacion",
            VisitCategory::Maintenance => "mantenimiento",
            VisitCategory::Urgent => "urgencia",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VisitCategory::Valuation => "Valuation",
            VisitCategory::Repair => "Repair",
            VisitCategory::Installation => "Installation",
            VisitCategory::Maintenance => "Maintenance",
            VisitCategory::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for VisitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Badge presentation for a status value: fixed label plus foreground and
/// background RGB. The lookup is total over each vocabulary, so no status
/// can render unstyled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStyle {
    pub label: &'static str,
    pub fg: (u8, u8, u8),
    pub bg: (u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum VisitStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "confirmada")]
    Confirmed,
    #[serde(rename = "en_curso")]
    InProgress,
    #[serde(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Pending => "pendiente",
            VisitStatus::Confirmed => "confirmada",
            VisitStatus::InProgress => "en_curso",
            VisitStatus::Completed => "completada",
            VisitStatus::Cancelled => "cancelada",
        }
    }

    pub fn style(&self) -> BadgeStyle {
        match self {
            VisitStatus::Pending => BadgeStyle {
                label: "Pending",
                fg: (243, 156, 18),
                bg: (254, 243, 226),
            },
            VisitStatus::Confirmed => BadgeStyle {
                label: "Confirmed",
                fg: (52, 152, 219),
                bg: (232, 244, 253),
            },
            VisitStatus::InProgress => BadgeStyle {
                label: "In progress",
                fg: (155, 89, 182),
                bg: (243, 232, 253),
            },
            VisitStatus::Completed => BadgeStyle {
                label: "Completed",
                fg: (39, 174, 96),
                bg: (232, 248, 239),
            },
            VisitStatus::Cancelled => BadgeStyle {
                label: "Cancelled",
                fg: (231, 76, 60),
                bg: (253, 232, 232),
            },
        }
    }

    /// Open, in the sense of "still needs attention" (the pending filter).
    pub fn is_open(&self) -> bool {
        matches!(self, VisitStatus::Pending | VisitStatus::Confirmed)
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style().label)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Visit {
    pub id: i64,
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "cliente_nombre", default)]
    pub client_name: Option<String>,
    #[serde(rename = "cliente_telefono", default)]
    pub client_phone: Option<String>,
    #[serde(rename = "cliente_direccion", default)]
    pub client_address: Option<String>,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "hora", default)]
    pub time: Option<String>,
    #[serde(rename = "tipo")]
    pub category: VisitCategory,
    #[serde(rename = "estado")]
    pub status: VisitStatus,
    #[serde(rename = "prioridad")]
    pub priority: String,
    #[serde(rename = "notas_internas", default)]
    pub internal_notes: Option<String>,
    #[serde(rename = "firma_cliente", default)]
    pub signature: Option<String>,
    #[serde(rename = "nombre_firmante", default)]
    pub signer_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VisitPayload {
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "tipo")]
    pub category: VisitCategory,
    #[serde(rename = "estado")]
    pub status: VisitStatus,
    #[serde(rename = "prioridad")]
    pub priority: String,
    #[serde(rename = "notas_internas")]
    pub internal_notes: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteVisitPayload {
    #[serde(rename = "firma_cliente")]
    pub signature: String,
    #[serde(rename = "nombre_firmante")]
    pub signer_name: String,
    #[serde(rename = "notas_internas")]
    pub internal_notes: String,
}

/// Visit form state as collected by the wizard, validated before any
/// request goes out.
#[derive(Debug)]
pub struct VisitForm {
    pub client_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub category: VisitCategory,
    pub status: VisitStatus,
    pub priority: String,
    pub internal_notes: String,
}

impl Default for VisitForm {
    fn default() -> Self {
        VisitForm {
            client_id: None,
            title: String::new(),
            description: String::new(),
            date: None,
            time: "09:00".to_string(),
            category: VisitCategory::Repair,
            status: VisitStatus::Pending,
            priority: "normal".to_string(),
            internal_notes: String::new(),
        }
    }
}

impl VisitForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title is required"));
        }
        if self.date.is_none() {
            errors.push(FieldError::new("date", "date is required"));
        }
        if self.client_id.is_none() {
            errors.push(FieldError::new("client", "select a client"));
        }
        errors
    }

    /// Returns `None` until the form passes validation.
    pub fn payload(&self) -> Option<VisitPayload> {
        if !self.validate().is_empty() {
            return None;
        }
        Some(VisitPayload {
            client_id: self.client_id?,
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date?,
            time: self.time.clone(),
            category: self.category,
            status: self.status,
            priority: self.priority.clone(),
            internal_notes: self.internal_notes.clone(),
        })
    }
}

// ==========================================
// Quotes
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum QuoteStatus {
    #[serde(rename = "borrador")]
    Draft,
    #[serde(rename = "enviado")]
    Sent,
    #[serde(rename = "aceptado")]
    Accepted,
    #[serde(rename = "rechazado")]
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "borrador",
            QuoteStatus::Sent => "enviado",
            QuoteStatus::Accepted => "aceptado",
            QuoteStatus::Rejected => "rechazado",
        }
    }

    pub fn style(&self) -> BadgeStyle {
        match self {
            QuoteStatus::Draft => BadgeStyle {
                label: "Draft",
                fg: (149, 165, 166),
                bg: (240, 240, 240),
            },
            QuoteStatus::Sent => BadgeStyle {
                label: "Sent",
                fg: (52, 152, 219),
                bg: (232, 244, 253),
            },
            QuoteStatus::Accepted => BadgeStyle {
                label: "Accepted",
                fg: (39, 174, 96),
                bg: (232, 248, 239),
            },
            QuoteStatus::Rejected => BadgeStyle {
                label: "Rejected",
                fg: (231, 76, 60),
                bg: (253, 232, 232),
            },
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, QuoteStatus::Draft | QuoteStatus::Sent)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style().label)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteLine {
    #[serde(rename = "concepto")]
    pub concept: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: f64,
    #[serde(rename = "precio_unitario")]
    pub unit_price: f64,
}

impl QuoteLine {
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    fn is_blank(&self) -> bool {
        self.concept.trim().is_empty() && self.unit_price == 0.0
    }
}

impl Default for QuoteLine {
    fn default() -> Self {
        QuoteLine {
            concept: String::new(),
            description: None,
            quantity: 1.0,
            unit_price: 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Quote {
    pub id: i64,
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "cliente_nombre", default)]
    pub client_name: Option<String>,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    pub subtotal: f64,
    #[serde(rename = "iva_porcentaje")]
    pub tax_rate: f64,
    #[serde(rename = "aplicar_iva")]
    pub apply_tax: bool,
    #[serde(rename = "iva_amount")]
    pub tax_amount: f64,
    pub total: f64,
    #[serde(rename = "estado")]
    pub status: QuoteStatus,
    #[serde(rename = "fecha_emision", default)]
    pub issued_on: Option<String>,
    #[serde(rename = "fecha_validez", default)]
    pub valid_until: Option<String>,
    #[serde(rename = "fecha_rechazo", default)]
    pub rejected_at: Option<String>,
    #[serde(rename = "dias_para_eliminar", default)]
    pub days_until_deletion: Option<i64>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    #[serde(rename = "lineas", default)]
    pub lines: Vec<QuoteLine>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuotePayload {
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "aplicar_iva")]
    pub apply_tax: bool,
    #[serde(rename = "iva_porcentaje")]
    pub tax_rate: f64,
    #[serde(rename = "fecha_validez")]
    pub valid_until: Option<String>,
    #[serde(rename = "notas")]
    pub notes: String,
    #[serde(rename = "lineas")]
    pub lines: Vec<QuoteLine>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Derives subtotal, tax and total from the line items and the tax
/// settings. Authoritative totals come back from the server; this is the
/// live preview shown while editing.
pub fn quote_totals(lines: &[QuoteLine], apply_tax: bool, tax_rate: f64) -> QuoteTotals {
    let subtotal: f64 = lines.iter().map(QuoteLine::total).sum();
    let tax = if apply_tax {
        subtotal * tax_rate / 100.0
    } else {
        0.0
    };
    QuoteTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

pub const DEFAULT_TAX_RATE: f64 = 21.0;

/// Quote form state. Line items are kept private so the list can never
/// drop below one entry: the draft seeds a blank line, the first real
/// line replaces an untouched seed, and removing the last line refuses.
#[derive(Debug)]
pub struct QuoteDraft {
    pub client_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub apply_tax: bool,
    pub tax_rate: f64,
    pub valid_until: Option<String>,
    pub notes: String,
    lines: Vec<QuoteLine>,
}

impl Default for QuoteDraft {
    fn default() -> Self {
        QuoteDraft {
            client_id: None,
            title: String::new(),
            description: String::new(),
            apply_tax: true,
            tax_rate: DEFAULT_TAX_RATE,
            valid_until: None,
            notes: String::new(),
            lines: vec![QuoteLine::default()],
        }
    }
}

impl QuoteDraft {
    pub fn lines(&self) -> &[QuoteLine] {
        &self.lines
    }

    pub fn push_line(&mut self, line: QuoteLine) {
        if self.lines.len() == 1 && self.lines[0].is_blank() {
            self.lines[0] = line;
        } else {
            self.lines.push(line);
        }
    }

    /// Removes a line unless it is the last one left; returns whether
    /// anything was removed.
    pub fn remove_line(&mut self, index: usize) -> bool {
        if self.lines.len() <= 1 || index >= self.lines.len() {
            return false;
        }
        self.lines.remove(index);
        true
    }

    pub fn totals(&self) -> QuoteTotals {
        quote_totals(&self.lines, self.apply_tax, self.tax_rate)
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title is required"));
        }
        if self.client_id.is_none() {
            errors.push(FieldError::new("client", "select a client"));
        }
        errors
    }

    pub fn payload(&self) -> Option<QuotePayload> {
        if !self.validate().is_empty() {
            return None;
        }
        Some(QuotePayload {
            client_id: self.client_id?,
            title: self.title.clone(),
            description: self.description.clone(),
            apply_tax: self.apply_tax,
            tax_rate: self.tax_rate,
            valid_until: self.valid_until.clone(),
            notes: self.notes.clone(),
            lines: self.lines.clone(),
        })
    }
}

// ==========================================
// Dashboard & statistics
// ==========================================

#[derive(Debug, Deserialize, Default)]
pub struct DashboardSummary {
    #[serde(rename = "visitas_hoy")]
    pub visits_today: i64,
    #[serde(rename = "visitas_pendientes")]
    pub pending_visits: i64,
    #[serde(rename = "total_clientes")]
    pub total_clients: i64,
    #[serde(rename = "presupuestos_pendientes")]
    pub pending_quotes: i64,
    #[serde(rename = "facturacion_mes")]
    pub month_revenue: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuoteStats {
    pub total: i64,
    #[serde(rename = "aceptados")]
    pub accepted: i64,
    #[serde(rename = "pendientes")]
    pub pending: i64,
    #[serde(rename = "rechazados")]
    pub rejected: i64,
    #[serde(rename = "tasa_conversion")]
    pub conversion_rate: f64,
}

// ==========================================
// Form validation
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        FieldError { field, message }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn looks_like_email(value: &str) -> bool {
    Regex::new(r"^\S+@\S+\.\S+$").unwrap().is_match(value)
}

/// Registration form, validated in the same two steps as the signup
/// screen: account details first, credentials second.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate_details(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        }
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "email is required"));
        } else if !looks_like_email(self.email.trim()) {
            errors.push(FieldError::new("email", "email does not look valid"));
        }
        if self.phone.trim().is_empty() {
            errors.push(FieldError::new("phone", "phone is required"));
        }
        errors
    }

    pub fn validate_credentials(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        } else if self.password.len() < 6 {
            errors.push(FieldError::new("password", "at least 6 characters"));
        }
        if self.password != self.confirm_password {
            errors.push(FieldError::new("confirm_password", "passwords do not match"));
        }
        errors
    }

    pub fn into_request(self) -> RegisterRequest {
        RegisterRequest {
            name: self.name,
            surname: self.surname,
            email: self.email,
            phone: self.phone,
            company: self.company,
            password: self.password,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn line(quantity: f64, unit_price: f64) -> QuoteLine {
        QuoteLine {
            concept: "work".to_string(),
            description: None,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn totals_apply_tax_example() {
        let lines = vec![line(2.0, 50.0), line(1.0, 30.0)];
        let t = quote_totals(&lines, true, 21.0);
        assert!(close(t.subtotal, 130.0));
        assert!(close(t.tax, 27.30));
        assert!(close(t.total, 157.30));
    }

    #[test]
    fn totals_without_tax() {
        let lines = vec![line(2.0, 50.0), line(1.0, 30.0)];
        let t = quote_totals(&lines, false, 21.0);
        assert!(close(t.subtotal, 130.0));
        assert!(close(t.tax, 0.0));
        assert!(close(t.total, 130.0));
    }

    #[test]
    fn totals_identity_on_degenerate_input() {
        // Coerced garbage arrives as zeros or negatives; the identity
        // total = subtotal + tax must still hold.
        let cases = vec![
            vec![line(0.0, 0.0)],
            vec![line(-2.0, 50.0), line(1.5, 19.99)],
            vec![line(0.0, 100.0), line(3.0, 0.0)],
        ];
        for lines in cases {
            for apply_tax in [true, false] {
                let t = quote_totals(&lines, apply_tax, 21.0);
                assert!(close(t.total, t.subtotal + t.tax));
                if !apply_tax {
                    assert!(close(t.tax, 0.0));
                }
            }
        }
    }

    #[test]
    fn draft_seeds_one_blank_line() {
        let draft = QuoteDraft::default();
        assert_eq!(draft.lines().len(), 1);
        assert!(draft.lines()[0].concept.is_empty());
        assert!(close(draft.lines()[0].quantity, 1.0));
    }

    #[test]
    fn first_line_replaces_blank_seed() {
        let mut draft = QuoteDraft::default();
        draft.push_line(line(2.0, 50.0));
        assert_eq!(draft.lines().len(), 1);
        assert_eq!(draft.lines()[0].concept, "work");

        draft.push_line(line(1.0, 30.0));
        assert_eq!(draft.lines().len(), 2);
    }

    #[test]
    fn removing_last_line_is_noop() {
        let mut draft = QuoteDraft::default();
        assert!(!draft.remove_line(0));
        assert_eq!(draft.lines().len(), 1);

        draft.push_line(line(2.0, 50.0));
        draft.push_line(line(1.0, 30.0));
        assert!(draft.remove_line(1));
        assert_eq!(draft.lines().len(), 1);
        assert!(!draft.remove_line(0));
        assert_eq!(draft.lines().len(), 1);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut draft = QuoteDraft::default();
        draft.push_line(line(2.0, 50.0));
        draft.push_line(line(1.0, 30.0));
        assert!(!draft.remove_line(5));
        assert_eq!(draft.lines().len(), 2);
    }

    #[test]
    fn client_form_empty_name_and_phone() {
        let form = ClientForm::default();
        let errors = form.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "phone");
    }

    #[test]
    fn client_form_whitespace_counts_as_empty() {
        let form = ClientForm {
            name: "   ".to_string(),
            phone: "\t".to_string(),
            ..ClientForm::default()
        };
        assert_eq!(form.validate().len(), 2);
    }

    #[test]
    fn client_form_valid() {
        let form = ClientForm {
            name: "Marta".to_string(),
            phone: "612 345 678".to_string(),
            ..ClientForm::default()
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn visit_form_requires_title_date_and_client() {
        let form = VisitForm::default();
        let errors = form.validate();
        assert_eq!(errors.len(), 3);
        assert!(form.payload().is_none());

        let form = VisitForm {
            client_id: Some(7),
            title: "Boiler repair".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14),
            ..VisitForm::default()
        };
        assert!(form.validate().is_empty());
        let payload = form.payload().expect("valid form must build a payload");
        assert_eq!(payload.client_id, 7);
        assert_eq!(payload.status, VisitStatus::Pending);
    }

    #[test]
    fn quote_draft_requires_title_and_client() {
        let draft = QuoteDraft::default();
        assert_eq!(draft.validate().len(), 2);
        assert!(draft.payload().is_none());

        let draft = QuoteDraft {
            client_id: Some(3),
            title: "AC installation".to_string(),
            ..QuoteDraft::default()
        };
        assert!(draft.validate().is_empty());
        let payload = draft.payload().expect("valid draft must build a payload");
        assert_eq!(payload.lines.len(), 1);
        assert!(close(payload.tax_rate, DEFAULT_TAX_RATE));
    }

    #[test]
    fn register_form_validation() {
        let form = RegisterForm {
            name: "Ana".to_string(),
            email: "not-an-email".to_string(),
            phone: "600000000".to_string(),
            password: "abc".to_string(),
            confirm_password: "abcd".to_string(),
            ..RegisterForm::default()
        };
        let details = form.validate_details();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "email");

        let credentials = form.validate_credentials();
        assert_eq!(credentials.len(), 2);

        let form = RegisterForm {
            name: "Ana".to_string(),
            email: "ana@taller.es".to_string(),
            phone: "600000000".to_string(),
            password: "secreto".to_string(),
            confirm_password: "secreto".to_string(),
            ..RegisterForm::default()
        };
        assert!(form.validate_details().is_empty());
        assert!(form.validate_credentials().is_empty());
    }

    #[test]
    fn status_wire_values_match_serde() {
        for status in VisitStatus::iter() {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, serde_json::Value::String(status.as_str().to_string()));
        }
        for status in QuoteStatus::iter() {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, serde_json::Value::String(status.as_str().to_string()));
        }
        for category in VisitCategory::iter() {
            let wire = serde_json::to_value(category).unwrap();
            assert_eq!(
                wire,
                serde_json::Value::String(category.as_str().to_string())
            );
        }
        for kind in ClientKind::iter() {
            let wire = serde_json::to_value(kind).unwrap();
            assert_eq!(wire, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn visit_status_styles_are_total() {
        for status in VisitStatus::iter() {
            let style = status.style();
            assert!(!style.label.is_empty());
        }
        let pending = VisitStatus::Pending.style();
        assert_eq!(pending.label, "Pending");
        assert_eq!(pending.fg, (243, 156, 18));
        assert_eq!(pending.bg, (254, 243, 226));
    }

    #[test]
    fn quote_status_styles_are_total() {
        for status in QuoteStatus::iter() {
            let style = status.style();
            assert!(!style.label.is_empty());
        }
        let rejected = QuoteStatus::Rejected.style();
        assert_eq!(rejected.label, "Rejected");
        assert_eq!(rejected.fg, (231, 76, 60));
    }

    #[test]
    fn open_status_filters() {
        assert!(VisitStatus::Pending.is_open());
        assert!(VisitStatus::Confirmed.is_open());
        assert!(!VisitStatus::Completed.is_open());
        assert!(QuoteStatus::Draft.is_open());
        assert!(!QuoteStatus::Rejected.is_open());
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("tecnico@taller.es"));
        assert!(!looks_like_email("tecnico"));
        assert!(!looks_like_email("tecnico@taller"));
        assert!(!looks_like_email("a b@c.d"));
    }

    #[test]
    fn visit_deserializes_from_wire_names() {
        let json = r#"{
            "id": 12,
            "cliente_id": 4,
            "cliente_nombre": "Marta Ruiz",
            "titulo": "Caldera sin presion",
            "fecha": "2025-03-14",
            "hora": "09:30",
            "tipo": "reparacion",
            "estado": "en_curso",
            "prioridad": "normal"
        }"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert_eq!(visit.category, VisitCategory::Repair);
        assert_eq!(visit.status, VisitStatus::InProgress);
        assert_eq!(visit.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(visit.client_name.as_deref(), Some("Marta Ruiz"));
    }

    #[test]
    fn quote_payload_serializes_wire_names() {
        let draft = QuoteDraft {
            client_id: Some(3),
            title: "Termo".to_string(),
            ..QuoteDraft::default()
        };
        let value = serde_json::to_value(draft.payload().unwrap()).unwrap();
        assert_eq!(value["cliente_id"], 3);
        assert_eq!(value["titulo"], "Termo");
        assert_eq!(value["aplicar_iva"], true);
        assert_eq!(value["iva_porcentaje"], 21.0);
        assert!(value["lineas"].is_array());
        assert_eq!(value["lineas"][0]["cantidad"], 1.0);
    }
}
