//! Dashboard view models: the doctor's queues and the medical-records desk
//! (patient listing, payments, registration slips, medicine inventory).

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;

use crate::api::{ClinicApi, MedicinePage, MedicineQuery, MedicineSort, PaymentUpdate, SortOrder};
use crate::error::AppError;
use crate::modals::StatsNotice;
use crate::models::{Doctor, DoctorStats, FeeStatus, Patient, VisitType};
use crate::pdf::{render_registration_pdf, save_download, PdfArtifact, PdfOptions};
use crate::session::{Debouncer, PatientQueueSession, QueueUpdate, RequestSequencer, Ticket};

// ═══════════════════════════════════════════════════════════
// Filtering and paging
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientFilter {
    pub query: String,
    pub fee_status: Option<FeeStatus>,
    pub visit_type: Option<VisitType>,
}

impl PatientFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Query matches name, mobile number or token number, ignoring case.
    pub fn matches(&self, patient: &Patient) -> bool {
        if self.fee_status.is_some_and(|s| s != patient.fee_status) {
            return false;
        }
        if self.visit_type.is_some_and(|v| v != patient.visit_type) {
            return false;
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        patient.full_name.to_lowercase().contains(&query)
            || patient
                .mobile_number
                .as_deref()
                .is_some_and(|m| m.contains(&query))
            || patient
                .token_number
                .is_some_and(|t| t.to_string() == query)
    }

    pub fn apply<'a>(&self, patients: &'a [Patient]) -> Vec<&'a Patient> {
        patients.iter().filter(|p| self.matches(p)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped into `1..=total_pages`.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    /// At least 1, so an empty list still has one (empty) page.
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        per_page,
        total_items: items.len(),
        total_pages,
    }
}

// ═══════════════════════════════════════════════════════════
// Doctor dashboard
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounters {
    pub total: usize,
    pub paid: usize,
    pub pending: usize,
    pub not_required: usize,
    pub prescribed: usize,
}

impl QueueCounters {
    pub fn tally<'a>(patients: impl IntoIterator<Item = &'a Patient>) -> Self {
        patients.into_iter().fold(Self::default(), |mut c, p| {
            c.total += 1;
            match p.fee_status {
                FeeStatus::Paid => c.paid += 1,
                FeeStatus::Pending => c.pending += 1,
                FeeStatus::NotRequired => c.not_required += 1,
            }
            if p.has_prescription() {
                c.prescribed += 1;
            }
            c
        })
    }
}

pub struct DoctorDashboard {
    pub doctor: Doctor,
    pub today: PatientQueueSession,
    pub emergency: Vec<Patient>,
    pub history: Vec<Patient>,
    pub stats: Option<DoctorStats>,
}

impl DoctorDashboard {
    pub fn new(doctor: Doctor) -> Self {
        Self {
            doctor,
            today: PatientQueueSession::new(),
            emergency: Vec::new(),
            history: Vec::new(),
            stats: None,
        }
    }

    /// Fetches today's, emergency and history lists. Any failure leaves
    /// the lists already held untouched.
    pub fn refresh(&mut self, api: &dyn ClinicApi) -> Result<QueueUpdate, AppError> {
        let today = api.today_patients(&self.doctor.id)?;
        let emergency = api.emergency_patients(&self.doctor.id)?;
        let history = api.patient_history(&self.doctor.id)?;

        let update = self.today.apply(today);
        self.emergency = emergency;
        self.history = history;
        tracing::info!(
            today = self.today.len(),
            emergency = self.emergency.len(),
            history = self.history.len(),
            "Doctor dashboard refreshed"
        );
        Ok(update)
    }

    pub fn refresh_stats(&mut self, api: &dyn ClinicApi) -> Result<Option<StatsNotice>, AppError> {
        let stats = api.doctor_stats(&self.doctor.id)?;
        let notice = StatsNotice::from_stats(&stats);
        self.doctor.is_available = stats.is_available;
        self.doctor.daily_patient_limit = Some(stats.daily_limit);
        self.stats = Some(stats);
        Ok(notice)
    }

    pub fn set_availability(&mut self, api: &dyn ClinicApi, available: bool) -> Result<(), AppError> {
        api.set_availability(&self.doctor.id, available)?;
        self.doctor.is_available = available;
        if let Some(stats) = self.stats.as_mut() {
            stats.is_available = available;
        }
        tracing::info!(doctor_id = %self.doctor.id, available, "Availability changed");
        Ok(())
    }

    pub fn counters(&self) -> QueueCounters {
        QueueCounters::tally(self.today.patients().iter())
    }

    /// Today's patients still waiting for a prescription, in token order.
    pub fn waiting(&self) -> Vec<Patient> {
        let mut waiting: Vec<Patient> = self
            .today
            .patients()
            .iter()
            .filter(|p| !p.has_prescription())
            .cloned()
            .collect();
        waiting.sort_by_key(|p| p.token_number.unwrap_or(u32::MAX));
        waiting
    }
}

// ═══════════════════════════════════════════════════════════
// Medical records dashboard
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub struct MedicalRecordsDashboard {
    pub patients: Vec<Patient>,
    pub filter: PatientFilter,
    pub page: usize,
    pub per_page: usize,
    options: PdfOptions,
}

impl MedicalRecordsDashboard {
    pub fn new(options: PdfOptions) -> Self {
        Self {
            patients: Vec::new(),
            filter: PatientFilter::default(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
            options,
        }
    }

    pub fn refresh(&mut self, api: &dyn ClinicApi) -> Result<usize, AppError> {
        self.patients = api.list_patients()?;
        tracing::info!(count = self.patients.len(), "Patient listing refreshed");
        Ok(self.patients.len())
    }

    /// Changing the filter resets to the first page.
    pub fn set_filter(&mut self, filter: PatientFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn visible(&self) -> Page<Patient> {
        let matched: Vec<Patient> = self.filter.apply(&self.patients).into_iter().cloned().collect();
        paginate(&matched, self.page, self.per_page)
    }

    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    /// Sends the update, then mirrors it on the local copy.
    pub fn update_payment(
        &mut self,
        api: &dyn ClinicApi,
        patient_id: &str,
        update: PaymentUpdate,
    ) -> Result<(), AppError> {
        api.update_payment(patient_id, &update)?;
        if let Some(p) = self.patients.iter_mut().find(|p| p.id == patient_id) {
            p.fee_status = update.fee_status;
            if update.payment_mode.is_some() {
                p.payment_mode = update.payment_mode;
            }
            if update.amount.is_some() {
                p.consultation_fee = update.amount;
            }
        }
        tracing::info!(patient_id, status = update.fee_status.as_str(), "Payment status updated");
        Ok(())
    }

    pub fn registration_pdf(&self, patient: &Patient, doctor: &Doctor) -> Result<PdfArtifact, AppError> {
        Ok(render_registration_pdf(patient, doctor, &self.options)?)
    }

    pub fn download_registration_pdf(
        &self,
        patient: &Patient,
        doctor: &Doctor,
        dir: &Path,
    ) -> Result<PathBuf, AppError> {
        let artifact = self.registration_pdf(patient, doctor)?;
        Ok(save_download(&artifact.bytes, &artifact.file_name, dir)?)
    }
}

// ═══════════════════════════════════════════════════════════
// Medicine inventory search
// ═══════════════════════════════════════════════════════════

/// Paged, sorted inventory search driven by a debounced text box.
pub struct InventorySearch {
    pub query: MedicineQuery,
    pub results: MedicinePage,
    pub suggestions: Vec<String>,
    debouncer: Debouncer<String>,
    sequencer: RequestSequencer,
}

impl Default for InventorySearch {
    fn default() -> Self {
        Self {
            query: MedicineQuery::default(),
            results: MedicinePage::default(),
            suggestions: Vec::new(),
            debouncer: Debouncer::default(),
            sequencer: RequestSequencer::default(),
        }
    }
}

impl InventorySearch {
    pub fn new(debouncer: Debouncer<String>) -> Self {
        Self {
            debouncer,
            ..Self::default()
        }
    }

    pub fn type_text(&mut self, text: impl Into<String>, now: Instant) {
        self.debouncer.push(text.into(), now);
    }

    /// Runs the search once typing has settled. Returns whether a fetch
    /// happened.
    pub fn tick(&mut self, api: &dyn ClinicApi, now: Instant) -> Result<bool, AppError> {
        let Some(text) = self.debouncer.ready(now) else {
            return Ok(false);
        };
        let text = text.trim().to_string();
        self.query.search = (!text.is_empty()).then_some(text);
        self.query.page = 1;
        self.fetch(api)?;
        Ok(true)
    }

    /// Issues a ticket for the current query. Pair with `finish`.
    pub fn begin(&mut self) -> (Ticket, MedicineQuery) {
        (self.sequencer.next(), self.query.clone())
    }

    /// Applies a response unless a newer one was already shown.
    pub fn finish(&mut self, ticket: Ticket, page: MedicinePage) -> bool {
        if !self.sequencer.accept(ticket) {
            return false;
        }
        self.results = page;
        true
    }

    pub fn fetch(&mut self, api: &dyn ClinicApi) -> Result<bool, AppError> {
        let (ticket, query) = self.begin();
        let page = api.search_medicines(&query)?;
        tracing::debug!(total = page.total, page = page.page, "Inventory search returned");
        Ok(self.finish(ticket, page))
    }

    /// Clicking the active column flips the order; a new column starts
    /// ascending.
    pub fn sort_by(&mut self, api: &dyn ClinicApi, column: MedicineSort) -> Result<bool, AppError> {
        if self.query.sort_by == column {
            self.query.sort_order = self.query.sort_order.toggled();
        } else {
            self.query.sort_by = column;
            self.query.sort_order = SortOrder::Asc;
        }
        self.query.page = 1;
        self.fetch(api)
    }

    pub fn go_to_page(&mut self, api: &dyn ClinicApi, page: u32) -> Result<bool, AppError> {
        let last = self.results.total_pages.max(1);
        self.query.page = page.clamp(1, last);
        self.fetch(api)
    }

    pub fn suggest(&mut self, api: &dyn ClinicApi, prefix: &str) -> Result<&[String], AppError> {
        self.suggestions = if prefix.trim().is_empty() {
            Vec::new()
        } else {
            api.medicine_suggestions(prefix.trim())?
        };
        Ok(self.suggestions.as_slice())
    }
}

pub fn inventory_export_file_name(date: NaiveDate) -> String {
    format!("medicine_inventory_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Downloads the inventory spreadsheet into `dir`.
pub fn export_inventory(api: &dyn ClinicApi, dir: &Path, date: NaiveDate) -> Result<PathBuf, AppError> {
    let bytes = api.export_inventory()?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(inventory_export_file_name(date));
    std::fs::write(&path, &bytes)?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Inventory exported");
    Ok(path)
}
