use std::collections::VecDeque;
use std::time::Instant;

use tracing::{error, info, trace, warn};

use crate::domain::{Message, SortDirection, SortSpec, ViewerConfig, ViewerError};
use crate::export::{ExportBlob, export};
use crate::paginator::{Page, clamp_page, paginate, total_pages};
use crate::pipeline::{View, recompute};
use crate::source::FileSource;
use crate::stats::{StatisticsReport, compute_stats};
use crate::store::{Dataset, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    EMPTY,
    LOADING,
    READY,
    QUITTING,
}

/// What the user asked to see. `page` always stays within the current view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub query: String,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: usize,
}

impl ViewState {
    fn new(page_size: usize) -> Self {
        ViewState {
            query: String::new(),
            sort: None,
            page: 1,
            page_size,
        }
    }
}

/// Everything a renderer needs for one repaint, detached from the model.
#[derive(Debug, Clone)]
pub struct UIData {
    pub name: String,
    pub headers: Vec<String>,
    pub sort: Option<SortSpec>,
    pub index: Vec<String>, // 1-based dataset row numbers of the page rows
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub total_columns: usize,
    pub page: Page,
    pub status: Status,
    pub status_message: String,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            sort: None,
            index: Vec::new(),
            rows: Vec::new(),
            total_rows: 0,
            filtered_rows: 0,
            total_columns: 0,
            page: paginate(0, 1, 1),
            status: Status::EMPTY,
            status_message: String::new(),
            last_update: Instant::now(),
        }
    }

    /// `↑`/`↓` for the sorted column, `↕` for the rest.
    pub fn sort_indicator(&self, column: usize) -> &'static str {
        match self.sort {
            Some(spec) if spec.column == column => spec.direction.indicator(),
            _ => "↕",
        }
    }

    pub fn row_count_label(&self) -> String {
        format!("{} rows", self.filtered_rows)
    }

    pub fn column_count_label(&self) -> String {
        format!("{} columns", self.total_columns)
    }

    pub fn summary(&self) -> String {
        if self.filtered_rows < self.total_rows {
            format!("Showing {} of {} rows", self.filtered_rows, self.total_rows)
        } else {
            format!("{} rows total", self.total_rows)
        }
    }
}

/// One viewing session: the current dataset, the view state and the derived view.
pub struct Model {
    config: ViewerConfig,
    pub status: Status,
    store: RecordStore,
    state: ViewState,
    view: View,
    pending_loads: VecDeque<FileSource>,
    uidata: UIData,
    status_message: String,
}

impl Model {
    pub fn init(config: &ViewerConfig) -> Self {
        let mut model = Model {
            config: config.clone(),
            status: Status::EMPTY,
            store: RecordStore::default(),
            state: ViewState::new(config.page_size.max(1)),
            view: View::default(),
            pending_loads: VecDeque::new(),
            uidata: UIData::empty(),
            status_message: "Open a file to start".to_string(),
        };
        model.update_uidata();
        model
    }

    pub fn update(&mut self, message: Message) -> Result<(), ViewerError> {
        trace!("Update: status {:?}, message {:?}", self.status, message);
        match message {
            Message::Load(source) => {
                self.request_load(source);
                while self.complete_pending_load()? {}
            }
            Message::Search(query) => self.search(&query),
            Message::ClearSearch => self.clear_search(),
            Message::Sort(column) => self.sort_by(column),
            Message::NextPage => self.next_page(),
            Message::PreviousPage => self.previous_page(),
            Message::GoToPage(page) => self.go_to_page(page),
            Message::SetPageSize(size) => self.set_page_size(size)?,
            Message::Quit => self.quit(),
        }
        Ok(())
    }

    // -------------------- Loading ---------------------- //

    /// Queues a file. Nothing is parsed until `complete_pending_load`, so a host
    /// can paint the loading state in between.
    pub fn request_load(&mut self, source: FileSource) {
        self.set_status_message(format!("Loading {} ...", source.name));
        self.pending_loads.push_back(source);
        self.status = Status::LOADING;
        self.update_uidata();
    }

    /// Applies the oldest queued load. Returns `Ok(false)` when the queue was empty.
    /// On failure the previous dataset and view state stay in place.
    pub fn complete_pending_load(&mut self) -> Result<bool, ViewerError> {
        let Some(source) = self.pending_loads.pop_front() else {
            return Ok(false);
        };
        let start_time = Instant::now();

        if let Err(e) = self.store.load(&source) {
            error!("Loading {} failed: {}", source.name, e);
            self.status = self.settled_status();
            self.set_status_message(e.to_string());
            self.update_uidata();
            return Err(e);
        }

        self.state = ViewState::new(self.state.page_size);
        self.view = recompute(self.store.dataset(), "", None);
        self.status = self.settled_status();
        let duration = start_time.elapsed().as_millis();
        info!("Loaded {} in {}ms", source.name, duration);
        self.set_status_message(format!(
            "Loaded {} rows in {}ms ...",
            self.dataset().nrows(),
            duration
        ));
        self.update_uidata();
        Ok(true)
    }

    pub fn load(&mut self, source: FileSource) -> Result<(), ViewerError> {
        self.update(Message::Load(source))
    }

    fn settled_status(&self) -> Status {
        if !self.pending_loads.is_empty() {
            Status::LOADING
        } else if self.store.generation() > 0 {
            Status::READY
        } else {
            Status::EMPTY
        }
    }

    // -------------------- View changes ---------------------- //

    pub fn search(&mut self, query: &str) {
        self.state.query = query.to_string();
        self.refresh_view();
        self.set_status_message(self.uidata.summary());
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    /// Sorts by `column`, flipping the direction if it is already the sort column.
    pub fn sort_by(&mut self, column: usize) {
        if column >= self.dataset().ncolumns() {
            if !self.dataset().is_empty() {
                warn!("Ignoring sort on unknown column {column}");
            }
            return;
        }
        let direction = match self.state.sort {
            Some(spec) if spec.column == column => spec.direction.flipped(),
            _ => SortDirection::Ascending,
        };
        self.state.sort = Some(SortSpec { column, direction });
        self.refresh_view();
    }

    /// Column position by header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.dataset().column_by_name(name).map(|c| c.idx)
    }

    fn refresh_view(&mut self) {
        self.view = recompute(self.store.dataset(), &self.state.query, self.state.sort);
        self.state.page = 1;
        self.update_uidata();
    }

    // -------------------- Pagination ---------------------- //

    pub fn next_page(&mut self) {
        if self.state.page < self.total_pages() {
            self.state.page += 1;
            self.update_uidata();
        }
    }

    pub fn previous_page(&mut self) {
        if self.state.page > 1 {
            self.state.page -= 1;
            self.update_uidata();
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.state.page = clamp_page(page, self.total_pages());
        self.update_uidata();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewerError> {
        if page_size == 0 {
            return Err(ViewerError::InvalidPageSize);
        }
        self.state.page_size = page_size;
        self.state.page = 1;
        self.update_uidata();
        Ok(())
    }

    fn total_pages(&self) -> usize {
        total_pages(self.view.len(), self.state.page_size)
    }

    pub fn page(&self) -> Page {
        paginate(self.view.len(), self.state.page, self.state.page_size)
    }

    /// Dataset rows on the current page, in display order.
    pub fn page_rows(&self) -> &[usize] {
        self.page().slice(&self.view.sorted)
    }

    // -------------------- Read side ---------------------- //

    /// Statistics over the filtered rows, regardless of sort and page.
    pub fn statistics(&self, column: &str) -> StatisticsReport {
        if self.dataset().is_empty() {
            return StatisticsReport::empty(column);
        }
        compute_stats(
            self.dataset(),
            &self.view.filtered,
            column,
            self.config.top_values,
        )
    }

    /// Every row of the current view in display order, as delimited text.
    pub fn export(&self) -> Result<ExportBlob, ViewerError> {
        export(self.dataset(), &self.view.sorted)
    }

    pub fn dataset(&self) -> &Dataset {
        self.store.dataset()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    fn update_uidata(&mut self) {
        let page = self.page();
        let dataset = self.store.dataset();
        let page_rows = page.slice(&self.view.sorted);

        self.uidata = UIData {
            name: dataset.name().to_string(),
            headers: dataset.headers().into_iter().map(str::to_string).collect(),
            sort: self.state.sort,
            index: page_rows.iter().map(|r| (r + 1).to_string()).collect(),
            rows: page_rows
                .iter()
                .filter_map(|&r| dataset.record(r))
                .map(|r| r.to_vec())
                .collect(),
            total_rows: dataset.nrows(),
            filtered_rows: self.view.len(),
            total_columns: dataset.ncolumns(),
            page,
            status: self.status,
            status_message: self.status_message.clone(),
            last_update: Instant::now(),
        };
    }
}
