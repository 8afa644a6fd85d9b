//! Filtering, sorting, selection and paging of record lists.
//!
//! Everything here is pure: list views and REST handlers build a
//! [`ListQuery`] and apply it to whatever the backend returned.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::types::{
    AccountStatus, Device, DeviceStatus, Module, ModuleStatus, Organization, OrganizationStatus,
    StatusParseError, StatusTag, User,
};

/// Either every record or only those with one status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: StatusTag> StatusFilter<T> {
    pub fn matches(&self, status: T) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }

    /// Parse `all` or a status key
    pub fn parse(value: &str) -> Result<Self, StatusParseError> {
        if value.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            T::parse_key(value).map(StatusFilter::Only)
        }
    }

    /// Next filter in the cycle All, first status, ..., last status, All
    pub fn cycle(&self) -> Self {
        let all = T::all();
        match self {
            StatusFilter::All => all.first().copied().map_or(StatusFilter::All, StatusFilter::Only),
            StatusFilter::Only(current) => {
                let idx = all.iter().position(|s| s == current).unwrap_or(0);
                all.get(idx + 1)
                    .copied()
                    .map_or(StatusFilter::All, StatusFilter::Only)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Ascending => "▲",
            SortOrder::Descending => "▼",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<K> {
    pub key: K,
    pub order: SortOrder,
}

impl<K> SortSpec<K> {
    pub fn ascending(key: K) -> Self {
        Self {
            key,
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(key: K) -> Self {
        Self {
            key,
            order: SortOrder::Descending,
        }
    }
}

/// A sortable column of a record type
pub trait SortKey: Copy + Eq + fmt::Debug + 'static {
    fn all() -> &'static [Self];
    fn key(&self) -> &'static str;
    fn label(&self) -> &'static str;

    fn parse_key(value: &str) -> Result<Self, String> {
        let wanted = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|k| k.key() == wanted)
            .ok_or_else(|| {
                let keys: Vec<&str> = Self::all().iter().map(|k| k.key()).collect();
                format!(
                    "unknown sort key '{}', expected one of: {}",
                    value,
                    keys.join(", ")
                )
            })
    }
}

/// A record that list views can filter and sort
pub trait Listable: Clone {
    type Status: StatusTag;
    type SortKey: SortKey;

    fn id(&self) -> &str;

    fn status(&self) -> Self::Status;

    /// Fields matched by the free-text query
    fn search_fields(&self) -> Vec<&str>;

    /// Ordering by `key` alone; ties are broken by id in [`compare_records`]
    fn compare_by(&self, other: &Self, key: Self::SortKey) -> Ordering;
}

/// Total ordering: the sort key first, then id
pub fn compare_records<R: Listable>(a: &R, b: &R, spec: SortSpec<R::SortKey>) -> Ordering {
    let ordering = a
        .compare_by(b, spec.key)
        .then_with(|| a.id().cmp(b.id()));
    match spec.order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// Records whose status passes `filter`, in their original order
pub fn filter_by_status<R: Listable>(records: &[R], filter: StatusFilter<R::Status>) -> Vec<R> {
    records
        .iter()
        .filter(|r| filter.matches(r.status()))
        .cloned()
        .collect()
}

pub fn sort_records<R: Listable>(records: &mut [R], spec: SortSpec<R::SortKey>) {
    records.sort_by(|a, b| compare_records(a, b, spec));
}

fn matches_text<R: Listable>(record: &R, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Status filter, text query and sort applied together
#[derive(Debug, Clone)]
pub struct ListQuery<R: Listable> {
    pub status: StatusFilter<R::Status>,
    pub text: String,
    pub sort: Option<SortSpec<R::SortKey>>,
}

impl<R: Listable> Default for ListQuery<R> {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            text: String::new(),
            sort: None,
        }
    }
}

impl<R: Listable> ListQuery<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, filter: StatusFilter<R::Status>) -> Self {
        self.status = filter;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn sort(mut self, spec: SortSpec<R::SortKey>) -> Self {
        self.sort = Some(spec);
        self
    }

    /// Sort by `key`; choosing the active key again flips the order
    pub fn toggle_sort(&mut self, key: R::SortKey) {
        self.sort = Some(match self.sort {
            Some(spec) if spec.key == key => SortSpec {
                key,
                order: spec.order.reversed(),
            },
            _ => SortSpec::ascending(key),
        });
    }

    pub fn apply(&self, records: &[R]) -> Vec<R> {
        let needle = self.text.trim().to_lowercase();
        let mut out: Vec<R> = records
            .iter()
            .filter(|r| self.status.matches(r.status()) && matches_text(*r, &needle))
            .cloned()
            .collect();
        if let Some(spec) = self.sort {
            sort_records(&mut out, spec);
        }
        out
    }
}

/// Ids picked for a bulk action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Select every visible id, or clear the whole selection when all of them
    /// are already selected
    pub fn toggle_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) {
        let visible: Vec<&str> = visible.into_iter().collect();
        if !visible.is_empty() && visible.iter().all(|id| self.ids.contains(*id)) {
            self.ids.clear();
        } else {
            self.ids.extend(visible.into_iter().map(str::to_string));
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Drop ids that are no longer present
    pub fn retain_known<'a>(&mut self, known: impl IntoIterator<Item = &'a str>) {
        let known: BTreeSet<&str> = known.into_iter().collect();
        self.ids.retain(|id| known.contains(id.as_str()));
    }
}

/// Number of pages for `total` items, at least one
pub fn page_count(total: usize, page_size: usize) -> usize {
    if total == 0 || page_size == 0 {
        1
    } else {
        total.div_ceil(page_size)
    }
}

/// Items of zero-based `page`; empty past the end
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

// =============================================================================
// Record bindings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSort {
    Name,
    Status,
    Kind,
    Battery,
    LastSeen,
}

impl SortKey for DeviceSort {
    fn all() -> &'static [Self] {
        &[
            DeviceSort::Name,
            DeviceSort::Status,
            DeviceSort::Kind,
            DeviceSort::Battery,
            DeviceSort::LastSeen,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            DeviceSort::Name => "name",
            DeviceSort::Status => "status",
            DeviceSort::Kind => "kind",
            DeviceSort::Battery => "battery",
            DeviceSort::LastSeen => "last_seen",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DeviceSort::Name => "Name",
            DeviceSort::Status => "Status",
            DeviceSort::Kind => "Type",
            DeviceSort::Battery => "Battery",
            DeviceSort::LastSeen => "Last seen",
        }
    }
}

impl Listable for Device {
    type Status = DeviceStatus;
    type SortKey = DeviceSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> DeviceStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.serial_number.as_str(), self.location.as_str()]
    }

    fn compare_by(&self, other: &Self, key: DeviceSort) -> Ordering {
        match key {
            DeviceSort::Name => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            DeviceSort::Status => self.status.cmp(&other.status),
            DeviceSort::Kind => self.kind.cmp(&other.kind),
            // Mains-powered devices sort before battery readings
            DeviceSort::Battery => self.battery_level.cmp(&other.battery_level),
            DeviceSort::LastSeen => self.last_seen.cmp(&other.last_seen),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSort {
    Name,
    Downloads,
    Rating,
    Price,
}

impl SortKey for ModuleSort {
    fn all() -> &'static [Self] {
        &[
            ModuleSort::Name,
            ModuleSort::Downloads,
            ModuleSort::Rating,
            ModuleSort::Price,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            ModuleSort::Name => "name",
            ModuleSort::Downloads => "downloads",
            ModuleSort::Rating => "rating",
            ModuleSort::Price => "price",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ModuleSort::Name => "Name",
            ModuleSort::Downloads => "Downloads",
            ModuleSort::Rating => "Rating",
            ModuleSort::Price => "Price",
        }
    }
}

impl Listable for Module {
    type Status = ModuleStatus;
    type SortKey = ModuleSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ModuleStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.publisher.as_str(), self.description.as_str()]
    }

    fn compare_by(&self, other: &Self, key: ModuleSort) -> Ordering {
        match key {
            ModuleSort::Name => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            ModuleSort::Downloads => self.downloads.cmp(&other.downloads),
            ModuleSort::Rating => self.rating.total_cmp(&other.rating),
            ModuleSort::Price => self.pricing.price.total_cmp(&other.pricing.price),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Name,
    Email,
    LastLogin,
}

impl SortKey for UserSort {
    fn all() -> &'static [Self] {
        &[UserSort::Name, UserSort::Email, UserSort::LastLogin]
    }

    fn key(&self) -> &'static str {
        match self {
            UserSort::Name => "name",
            UserSort::Email => "email",
            UserSort::LastLogin => "last_login",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            UserSort::Name => "Name",
            UserSort::Email => "Email",
            UserSort::LastLogin => "Last login",
        }
    }
}

impl Listable for User {
    type Status = AccountStatus;
    type SortKey = UserSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> AccountStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }

    fn compare_by(&self, other: &Self, key: UserSort) -> Ordering {
        match key {
            UserSort::Name => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            UserSort::Email => self.email.cmp(&other.email),
            UserSort::LastLogin => self.last_login.cmp(&other.last_login),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationSort {
    Name,
    CreatedAt,
}

impl SortKey for OrganizationSort {
    fn all() -> &'static [Self] {
        &[OrganizationSort::Name, OrganizationSort::CreatedAt]
    }

    fn key(&self) -> &'static str {
        match self {
            OrganizationSort::Name => "name",
            OrganizationSort::CreatedAt => "created_at",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OrganizationSort::Name => "Name",
            OrganizationSort::CreatedAt => "Created",
        }
    }
}

impl Listable for Organization {
    type Status = OrganizationStatus;
    type SortKey = OrganizationSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> OrganizationStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.industry.as_str(), self.address.city.as_str()]
    }

    fn compare_by(&self, other: &Self, key: OrganizationSort) -> Ordering {
        match key {
            OrganizationSort::Name => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            OrganizationSort::CreatedAt => self.created_at.cmp(&other.created_at),
        }
    }
}
