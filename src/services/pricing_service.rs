use std::{fmt, str::FromStr};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    booking::{BookingRequest, PricedBooking},
    event::{normalize_price, parse_price, AddOn, Event, OptionInput, Package, PricedOption},
};

/// Whether the event's base price is part of the total once packages are
/// in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingPolicy {
    /// Selected packages plus selected add-ons. The base price is only a
    /// "starting from" label.
    #[default]
    Selection,
    /// Base price plus selected packages plus selected add-ons.
    BasePlusSelection,
}

impl FromStr for PricingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "selection" => Ok(PricingPolicy::Selection),
            "base-plus-selection" => Ok(PricingPolicy::BasePlusSelection),
            other => Err(format!(
                "expected `selection` or `base-plus-selection`, got `{}`",
                other
            )),
        }
    }
}

impl fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingPolicy::Selection => f.write_str("selection"),
            PricingPolicy::BasePlusSelection => f.write_str("base-plus-selection"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("Package not found for this event: {0}")]
    UnknownPackage(String),

    #[error("Add-on not found for this event: {0}")]
    UnknownAddOn(String),

    #[error("Please select a package to continue.")]
    NoPackageSelected,

    #[error("Event pricing has changed, please review your selection")]
    TotalMismatch { quoted: f64, current: f64 },
}

/// The packages and add-ons a buyer currently has chosen for one event.
///
/// Equality ignores order but counts repeats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub selected_packages: Vec<Package>,
    #[serde(default)]
    pub selected_add_ons: Vec<AddOn>,
}

impl Selection {
    pub fn new(packages: Vec<Package>, add_ons: Vec<AddOn>) -> Self {
        Selection {
            selected_packages: packages,
            selected_add_ons: add_ons,
        }
    }

    pub fn has_package(&self, pkg: &Package) -> bool {
        contains(&self.selected_packages, pkg)
    }

    pub fn has_add_on(&self, add_on: &AddOn) -> bool {
        contains(&self.selected_add_ons, add_on)
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        same_set(&self.selected_packages, &other.selected_packages)
            && same_set(&self.selected_add_ons, &other.selected_add_ons)
    }
}

/// Display outputs for the detail view.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub total_price: f64,
    pub discount_percent: u8,
    pub can_book: bool,
    pub starting_from: Option<f64>,
}

pub struct PricingService;

impl PricingService {
    /// Selection identity. Options with ids compare by id, options without
    /// ids compare by `(name, price)`, and an option with an id is never the
    /// same as one without.
    pub fn same_option(a: &PricedOption, b: &PricedOption) -> bool {
        match (non_empty(&a.id), non_empty(&b.id)) {
            (Some(left), Some(right)) => left == right,
            (None, None) => same_name_and_price(a, b),
            _ => false,
        }
    }

    /// Whether a requested option refers to a stored event record. Ids
    /// decide when both sides carry one; otherwise `(name, price)` does.
    fn refers_to(record: &PricedOption, requested: &PricedOption) -> bool {
        match (non_empty(&record.id), non_empty(&requested.id)) {
            (Some(left), Some(right)) => left == right,
            _ => same_name_and_price(record, requested),
        }
    }

    pub fn toggle_add_on(mut selection: Selection, add_on: &AddOn) -> Selection {
        toggle(&mut selection.selected_add_ons, add_on);
        selection
    }

    /// Multi-select toggle of a package.
    pub fn toggle_package(mut selection: Selection, pkg: &Package) -> Selection {
        toggle(&mut selection.selected_packages, pkg);
        selection
    }

    /// Single-select mode: the package replaces whatever was chosen before.
    pub fn select_package(mut selection: Selection, pkg: &Package) -> Selection {
        selection.selected_packages = vec![pkg.clone()];
        selection
    }

    pub fn compute_total(event: &Event, selection: &Selection) -> f64 {
        Self::compute_total_with_policy(PricingPolicy::default(), event, selection)
    }

    pub fn compute_total_with_policy(
        policy: PricingPolicy,
        event: &Event,
        selection: &Selection,
    ) -> f64 {
        let base = match policy {
            PricingPolicy::Selection => 0.0,
            PricingPolicy::BasePlusSelection => normalize_price(event.price),
        };
        let packages: f64 = selection
            .selected_packages
            .iter()
            .map(|p| normalize_price(p.price))
            .sum();
        let add_ons: f64 = selection
            .selected_add_ons
            .iter()
            .map(|a| normalize_price(a.price))
            .sum();

        round_currency(base + packages + add_ons)
    }

    /// Percentage of `originalPrice` knocked off by the current price.
    pub fn compute_discount_percent(event: &Event) -> u8 {
        let price = normalize_price(event.price);
        match event.original_price.map(normalize_price) {
            Some(original) if original > price => {
                (100.0 * (original - price) / original).round().clamp(0.0, 100.0) as u8
            }
            _ => 0,
        }
    }

    pub fn can_book(selection: &Selection) -> bool {
        !selection.selected_packages.is_empty()
    }

    /// Base price shown as a "starting from" label until a package is chosen.
    pub fn starting_from(event: &Event, selection: &Selection) -> Option<f64> {
        if Self::can_book(selection) {
            None
        } else {
            Some(normalize_price(event.price))
        }
    }

    pub fn build_booking_payload(
        event: &Event,
        selection: &Selection,
        total_price: f64,
    ) -> BookingRequest {
        BookingRequest {
            event_id: event.id.map(|id| id.to_hex()).unwrap_or_default(),
            packages: selection.selected_packages.clone(),
            add_ons: selection.selected_add_ons.clone(),
            total_price: normalize_price(total_price),
        }
    }

    /// A candidate is acceptable when it has a name and a numeric,
    /// non-negative price.
    pub fn validate_package_or_add_on(candidate: &OptionInput) -> bool {
        let has_name = candidate
            .name
            .as_deref()
            .map_or(false, |name| !name.trim().is_empty());
        let has_price = candidate
            .price
            .as_ref()
            .and_then(parse_price)
            .map_or(false, |price| price >= 0.0);

        has_name && has_price
    }

    /// Converts a valid candidate into a stored option with a fresh id.
    pub fn accept_option(candidate: OptionInput) -> Option<PricedOption> {
        if !Self::validate_package_or_add_on(&candidate) {
            return None;
        }
        let price = candidate.price.as_ref().and_then(parse_price)?;
        let mut option = PricedOption {
            id: candidate.id,
            name: candidate.name?.trim().to_string(),
            price: normalize_price(price),
            description: candidate.description.filter(|d| !d.trim().is_empty()),
        };
        option.ensure_id();
        Some(option)
    }

    /// Resolves every selected option against the event and returns the
    /// selection rebuilt from the event's own records, so prices come from
    /// the event rather than the caller.
    pub fn validate_selection(
        event: &Event,
        selection: &Selection,
    ) -> Result<Selection, SelectionError> {
        let mut resolved = Selection::default();

        for pkg in &selection.selected_packages {
            let found = event
                .packages
                .iter()
                .find(|candidate| Self::refers_to(candidate, pkg))
                .ok_or_else(|| SelectionError::UnknownPackage(pkg.name.clone()))?;
            if !resolved.has_package(found) {
                resolved.selected_packages.push(found.clone());
            }
        }

        for add_on in &selection.selected_add_ons {
            let found = event
                .add_ons
                .iter()
                .find(|candidate| Self::refers_to(candidate, add_on))
                .ok_or_else(|| SelectionError::UnknownAddOn(add_on.name.clone()))?;
            if !resolved.has_add_on(found) {
                resolved.selected_add_ons.push(found.clone());
            }
        }

        Ok(resolved)
    }

    pub fn quote(policy: PricingPolicy, event: &Event, selection: &Selection) -> Quote {
        Quote {
            total_price: Self::compute_total_with_policy(policy, event, selection),
            discount_percent: Self::compute_discount_percent(event),
            can_book: Self::can_book(selection),
            starting_from: Self::starting_from(event, selection),
        }
    }

    /// Amount charged for a booking covering `attendees` people.
    pub fn booking_total(selection_total: f64, attendees: u32) -> f64 {
        round_currency(normalize_price(selection_total) * f64::from(attendees.max(1)))
    }

    pub fn totals_match(left: f64, right: f64) -> bool {
        (round_currency(left) - round_currency(right)).abs() < 0.005
    }

    /// Re-prices a booking request against the stored event. The selection
    /// is rebuilt from the event's records, a non-zero client total must
    /// agree with the server total, and the charged amount covers every
    /// attendee (a missing or zero count means one).
    pub fn price_booking(
        policy: PricingPolicy,
        event: &Event,
        request: &BookingRequest,
        attendees: Option<u32>,
    ) -> Result<PricedBooking, SelectionError> {
        let requested = Selection::new(request.packages.clone(), request.add_ons.clone());
        if !Self::can_book(&requested) {
            return Err(SelectionError::NoPackageSelected);
        }

        let selection = Self::validate_selection(event, &requested)?;
        let total = Self::compute_total_with_policy(policy, event, &selection);

        // Zero means the client never quoted.
        if request.total_price != 0.0 && !Self::totals_match(total, request.total_price) {
            warn!(
                "Booking for event {:?} quoted {} but current total is {}",
                event.id, request.total_price, total
            );
            return Err(SelectionError::TotalMismatch {
                quoted: request.total_price,
                current: total,
            });
        }

        let attendees = attendees.unwrap_or(1).max(1);
        Ok(PricedBooking {
            packages: selection.selected_packages,
            add_ons: selection.selected_add_ons,
            attendees,
            total_price: Self::booking_total(total, attendees),
        })
    }
}

fn round_currency(amount: f64) -> f64 {
    normalize_price((amount * 100.0).round() / 100.0)
}

fn non_empty(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

fn same_name_and_price(a: &PricedOption, b: &PricedOption) -> bool {
    a.name == b.name && normalize_price(a.price) == normalize_price(b.price)
}

fn contains(options: &[PricedOption], option: &PricedOption) -> bool {
    options
        .iter()
        .any(|candidate| PricingService::same_option(candidate, option))
}

fn toggle(options: &mut Vec<PricedOption>, option: &PricedOption) {
    if contains(options, option) {
        options.retain(|candidate| !PricingService::same_option(candidate, option));
    } else {
        options.push(option.clone());
    }
}

fn same_set(left: &[PricedOption], right: &[PricedOption]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut used = vec![false; right.len()];
    left.iter().all(|option| {
        let found = (0..right.len())
            .find(|&index| !used[index] && PricingService::same_option(&right[index], option));
        match found {
            Some(index) => {
                used[index] = true;
                true
            }
            None => false,
        }
    })
}
