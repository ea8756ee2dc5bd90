//! Admin Content Page
//!
//! Headless controller behind each admin content screen: a Management tab
//! with a filtered, paginated table and CRUD actions, and an Insights tab
//! with statistics over every record plus CSV export.
//!
//! Every fetch takes a [`FetchTicket`]. When the user switches tabs or
//! filters while a request is in flight, the older response is discarded
//! instead of overwriting the newer view.

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::api::PaginationMeta;
use crate::calendar::kst;
use crate::client::{AdminApiClient, ClientError, Page, Session};
use crate::content::{
    ContentForm, ContentItem, ContentKind, ContentStatus, ListQuery, ValidationErrors,
};
use crate::insights::Insights;
use crate::report::{self, ReportContext, ReportError};

pub const LOGIN_PATH: &str = "/admin/login";
pub const EXPIRED_LOGIN_PATH: &str = "/admin/login?expired=true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Management,
    Insights,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Idle,
    LoadingManagement,
    LoadingInsights,
    Loaded,
    Error(String),
}

/// Where the page sends the user when the session is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Expired,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Login => LOGIN_PATH,
            Redirect::Expired => EXPIRED_LOGIN_PATH,
        }
    }
}

/// Generation number of a fetch. Only the most recent ticket may apply
/// its response.
///
/// The `load_*` methods hold `&mut self` across their request, so they never
/// overlap. Callers that drive requests themselves (for example from
/// spawned tasks) call [`AdminContentPage::issue_ticket`], run the request,
/// then hand the result to `apply_management` or `apply_insights`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Saved(ContentItem),
    Deleted,
    /// The user declined the confirmation prompt.
    Cancelled,
    /// Rejected locally; no request was sent.
    Invalid(ValidationErrors),
    /// The request failed; the message is also on the error banner.
    Failed(String),
}

pub struct AdminContentPage {
    kind: ContentKind,
    client: AdminApiClient,
    session: Session,
    tab: Tab,
    state: PageState,
    query: ListQuery,
    items: Vec<ContentItem>,
    meta: Option<PaginationMeta>,
    all_items: Vec<ContentItem>,
    insights: Option<Insights>,
    error: Option<String>,
    redirect: Option<Redirect>,
    generation: u64,
}

impl AdminContentPage {
    /// `url_query` is the query string of the page URL, e.g.
    /// `page=2&category=GUIDE`.
    pub fn new(kind: ContentKind, client: AdminApiClient, session: Session, url_query: &str) -> Self {
        Self {
            kind,
            client,
            session,
            tab: Tab::default(),
            state: PageState::Idle,
            query: ListQuery::from_query_string(url_query),
            items: Vec::new(),
            meta: None,
            all_items: Vec::new(),
            insights: None,
            error: None,
            redirect: None,
            generation: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn meta(&self) -> Option<&PaginationMeta> {
        self.meta.as_ref()
    }

    pub fn all_items(&self) -> &[ContentItem] {
        &self.all_items
    }

    pub fn insights(&self) -> Option<&Insights> {
        self.insights.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn redirect(&self) -> Option<Redirect> {
        self.redirect
    }

    /// Current error banner, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Page URL reflecting the current filters.
    pub fn page_url(&self) -> String {
        self.query.page_url(self.kind)
    }

    // ========================================================================
    // Tabs and filters
    // ========================================================================

    pub async fn activate_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.refresh().await;
    }

    /// Reload whatever the active tab shows.
    pub async fn refresh(&mut self) {
        match self.tab {
            Tab::Management => self.load_management().await,
            Tab::Insights => self.load_insights().await,
        }
    }

    pub async fn set_filter(&mut self, category: Option<String>, status: Option<ContentStatus>) {
        self.query.category = category.filter(|c| !c.trim().is_empty());
        self.query.status = status;
        self.query.page = 1;
        self.show_management().await;
    }

    pub async fn set_search(&mut self, term: &str) {
        let term = term.trim();
        self.query.search = (!term.is_empty()).then(|| term.to_string());
        self.query.page = 1;
        self.show_management().await;
    }

    pub async fn go_to_page(&mut self, page: u32) {
        self.query.page = page.max(1);
        self.show_management().await;
    }

    /// Filters and pages only apply to the table, so changing them always
    /// lands on the Management tab.
    async fn show_management(&mut self) {
        self.tab = Tab::Management;
        self.load_management().await;
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    pub fn issue_ticket(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket(self.generation)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Token for the next request. Without one the page redirects to the
    /// login screen and no request is made.
    fn require_token(&mut self) -> Option<String> {
        match self.session.token() {
            Some(token) => Some(token.to_string()),
            None => {
                self.redirect = Some(Redirect::Login);
                self.state = PageState::Idle;
                None
            }
        }
    }

    pub async fn load_management(&mut self) {
        let Some(token) = self.require_token() else {
            return;
        };
        let ticket = self.issue_ticket();
        self.state = PageState::LoadingManagement;
        let result = self.client.list(&token, self.kind, &self.query).await;
        self.apply_management(ticket, result);
    }

    pub async fn load_insights(&mut self) {
        let Some(token) = self.require_token() else {
            return;
        };
        let ticket = self.issue_ticket();
        self.state = PageState::LoadingInsights;
        let result = self.client.list_all(&token, self.kind).await;
        self.apply_insights(ticket, result);
    }

    /// Apply a management response. Returns false when the ticket is stale
    /// and the response was dropped.
    pub fn apply_management(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page<ContentItem>, ClientError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(kind = %self.kind, "Discarding stale management response");
            return false;
        }
        match result {
            Ok(page) => {
                self.items = page.items;
                self.meta = Some(page.meta);
                self.state = PageState::Loaded;
            }
            Err(e) => self.fail(e),
        }
        true
    }

    pub fn apply_insights(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<ContentItem>, ClientError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(kind = %self.kind, "Discarding stale insights response");
            return false;
        }
        match result {
            Ok(items) => {
                self.insights = Some(Insights::from_items(self.kind, &items));
                self.all_items = items;
                self.state = PageState::Loaded;
            }
            Err(e) => self.fail(e),
        }
        true
    }

    fn fail(&mut self, error: ClientError) {
        if error.is_auth() {
            tracing::warn!(kind = %self.kind, "Session rejected: {}", error);
            self.session.clear();
            self.redirect = Some(Redirect::Expired);
            self.state = PageState::Idle;
            return;
        }
        let message = error.to_string();
        tracing::error!(kind = %self.kind, "Admin request failed: {}", message);
        self.error = Some(message.clone());
        self.state = PageState::Error(message);
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&mut self, form: ContentForm) -> MutationOutcome {
        let input = match form.into_input(self.kind) {
            Ok(input) => input,
            Err(errors) => return MutationOutcome::Invalid(errors),
        };
        let Some(token) = self.require_token() else {
            return MutationOutcome::Failed(ClientError::MissingToken.to_string());
        };

        let result = self.client.create(&token, self.kind, &input).await;
        self.finish_mutation(result.map(MutationOutcome::Saved)).await
    }

    /// Save an edit after `confirm` approves it.
    pub async fn update<F>(&mut self, id: &str, form: ContentForm, confirm: F) -> MutationOutcome
    where
        F: FnOnce(&str) -> bool,
    {
        let input = match form.into_update(self.kind) {
            Ok(input) => input,
            Err(errors) => return MutationOutcome::Invalid(errors),
        };
        if !confirm(&format!("이 {}을(를) 수정하시겠습니까?", self.kind.noun())) {
            return MutationOutcome::Cancelled;
        }
        let Some(token) = self.require_token() else {
            return MutationOutcome::Failed(ClientError::MissingToken.to_string());
        };

        let result = self.client.update(&token, self.kind, id, &input).await;
        self.finish_mutation(result.map(MutationOutcome::Saved)).await
    }

    pub async fn delete<F>(&mut self, id: &str, confirm: F) -> MutationOutcome
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(&format!("정말 이 {}을(를) 삭제하시겠습니까?", self.kind.noun())) {
            return MutationOutcome::Cancelled;
        }
        let Some(token) = self.require_token() else {
            return MutationOutcome::Failed(ClientError::MissingToken.to_string());
        };

        let result = self.client.delete(&token, self.kind, id).await;
        self.finish_mutation(result.map(|_| MutationOutcome::Deleted)).await
    }

    /// Successful mutations reload the table from the server.
    async fn finish_mutation(
        &mut self,
        result: Result<MutationOutcome, ClientError>,
    ) -> MutationOutcome {
        match result {
            Ok(outcome) => {
                self.load_management().await;
                outcome
            }
            Err(e) => {
                let message = e.to_string();
                self.fail(e);
                MutationOutcome::Failed(message)
            }
        }
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Write the CSV report into `dir`. `Ok(None)` when insights have not
    /// been loaded yet.
    pub fn export_report(&mut self, dir: &Path) -> Result<Option<PathBuf>, ReportError> {
        self.export_report_with(dir, ReportContext::new(Utc::now().with_timezone(&kst())))
    }

    pub fn export_report_with(
        &mut self,
        dir: &Path,
        ctx: ReportContext,
    ) -> Result<Option<PathBuf>, ReportError> {
        let Some(insights) = &self.insights else {
            return Ok(None);
        };

        let document = report::format_report(insights, &self.all_items, &ctx);
        let file_name = report::report_file_name(self.kind, ctx.file_date());
        match report::write_report(dir, &file_name, &document) {
            Ok(path) => Ok(Some(path)),
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
