//! Dashboard aggregation, speed-to-lead and agent leaderboard
//!
//! All functions work on rows already filtered by project and date range.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};

use crate::services::csv_import::phone_key;
use crate::types::{
    AdSpend, Agent, Appointment, AppointmentStatus, Call, DashboardStats, Lead, LeaderboardEntry, SpeedToLead,
};

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn is_confirmed(a: &Appointment) -> bool {
    a.confirmed || a.parsed_status() == Some(AppointmentStatus::Confirmed)
}

/// Attendance from the explicit flag, else from the status
fn attendance(a: &Appointment) -> Option<bool> {
    a.showed.or_else(|| a.parsed_status().and_then(|s| s.implied_showed()))
}

fn is_cancelled(a: &Appointment) -> bool {
    a.parsed_status() == Some(AppointmentStatus::Cancelled)
}

pub fn compute_stats(leads: &[Lead], calls: &[Call], appointments: &[Appointment], ad_spend: &[AdSpend]) -> DashboardStats {
    let booked = appointments.len();
    let confirmed = appointments.iter().filter(|a| is_confirmed(a)).count();
    let showed = appointments.iter().filter(|a| attendance(a) == Some(true)).count();
    let no_shows = appointments.iter().filter(|a| attendance(a) == Some(false)).count();
    let cancelled = appointments.iter().filter(|a| is_cancelled(a)).count();
    let spend: f64 = ad_spend.iter().map(|s| s.spend).sum();
    let spend = (spend * 100.0).round() / 100.0;

    let speeds = speed_to_lead(leads, calls);
    let avg_speed = if speeds.is_empty() {
        None
    } else {
        Some(speeds.iter().map(|s| s.seconds as f64).sum::<f64>() / speeds.len() as f64)
    };

    DashboardStats {
        total_leads: leads.len(),
        total_calls: calls.len(),
        appointments_booked: booked,
        confirmed,
        showed,
        no_shows,
        cancelled,
        booking_rate: ratio(booked as f64, leads.len() as f64),
        show_rate: ratio(showed as f64, (showed + no_shows) as f64),
        ad_spend: spend,
        cost_per_lead: ratio(spend, leads.len() as f64),
        cost_per_appointment: ratio(spend, booked as f64),
        cost_per_show: ratio(spend, showed as f64),
        avg_speed_to_lead_seconds: avg_speed,
        leads_called: speeds.len(),
    }
}

/// When the lead came in. Rows recorded after their lead date were imported
/// later, so their `created_at` is the import time; those count from the
/// start of the lead date (UTC).
fn lead_arrival(lead: &Lead) -> DateTime<Utc> {
    if lead.created_at.date_naive() > lead.date {
        lead.date.and_time(NaiveTime::default()).and_utc()
    } else {
        lead.created_at
    }
}

/// Seconds from each lead's arrival to the first call made to the same
/// number in the same project. Leads that were never called are omitted.
pub fn speed_to_lead(leads: &[Lead], calls: &[Call]) -> Vec<SpeedToLead> {
    let mut by_number: HashMap<(String, String), Vec<DateTime<Utc>>> = HashMap::new();
    for call in calls {
        if let Some(key) = phone_key(&call.lead_phone_number) {
            by_number
                .entry((call.project_name.to_lowercase(), key))
                .or_default()
                .push(call.call_datetime);
        }
    }
    for times in by_number.values_mut() {
        times.sort();
    }

    leads
        .iter()
        .filter_map(|lead| {
            let key = phone_key(lead.phone_number.as_deref()?)?;
            let times = by_number.get(&(lead.project_name.to_lowercase(), key))?;
            let arrived = lead_arrival(lead);
            let idx = times.partition_point(|t| *t < arrived);
            let first = times.get(idx)?;
            Some(SpeedToLead {
                lead_id: lead.id,
                seconds: (*first - arrived).num_seconds(),
            })
        })
        .collect()
}

#[derive(Default)]
struct Tally {
    agent_id: Option<uuid::Uuid>,
    agent_number: Option<String>,
    agent_name: String,
    active: bool,
    calls: usize,
    talk_time: i64,
    timed_calls: usize,
    booked: usize,
    confirmed: usize,
    showed: usize,
    no_shows: usize,
}

impl Tally {
    fn has_activity(&self) -> bool {
        self.calls > 0 || self.booked > 0
    }

    fn into_entry(self) -> LeaderboardEntry {
        LeaderboardEntry {
            agent_id: self.agent_id,
            agent_number: self.agent_number,
            agent_name: self.agent_name,
            total_calls: self.calls,
            talk_time_seconds: self.talk_time,
            avg_call_duration_seconds: ratio(self.talk_time as f64, self.timed_calls as f64),
            appointments_booked: self.booked,
            confirmed: self.confirmed,
            showed: self.showed,
            show_rate: ratio(self.showed as f64, (self.showed + self.no_shows) as f64),
        }
    }
}

/// Index of the tally for an agent reference; unknown references get their
/// own entry keyed by the lowercased text.
fn tally_for<'a>(
    tallies: &'a mut Vec<Tally>,
    unknown: &mut HashMap<String, usize>,
    agents: &[Agent],
    reference: &str,
) -> Option<&'a mut Tally> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Some(idx) = agents.iter().position(|a| a.matches(reference)) {
        return tallies.get_mut(idx);
    }
    let idx = *unknown.entry(reference.to_lowercase()).or_insert_with(|| {
        tallies.push(Tally {
            agent_name: reference.to_string(),
            active: true,
            ..Default::default()
        });
        tallies.len() - 1
    });
    tallies.get_mut(idx)
}

pub fn leaderboard(agents: &[Agent], calls: &[Call], appointments: &[Appointment]) -> Vec<LeaderboardEntry> {
    let mut tallies: Vec<Tally> = agents
        .iter()
        .map(|a| Tally {
            agent_id: Some(a.id),
            agent_number: Some(a.agent_number.clone()),
            agent_name: a.agent_name.clone(),
            active: a.active,
            ..Default::default()
        })
        .collect();
    let mut unknown = HashMap::new();

    for call in calls {
        let Some(reference) = call.agent.as_deref() else { continue };
        if let Some(t) = tally_for(&mut tallies, &mut unknown, agents, reference) {
            t.calls += 1;
            if let Some(secs) = call.duration_seconds {
                t.talk_time += i64::from(secs);
                t.timed_calls += 1;
            }
        }
    }

    for appt in appointments {
        let Some(reference) = appt.agent_number.as_deref().or(appt.agent.as_deref()) else {
            continue;
        };
        if let Some(t) = tally_for(&mut tallies, &mut unknown, agents, reference) {
            t.booked += 1;
            if is_confirmed(appt) {
                t.confirmed += 1;
            }
            match attendance(appt) {
                Some(true) => t.showed += 1,
                Some(false) => t.no_shows += 1,
                None => {}
            }
        }
    }

    let mut entries: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .filter(|t| t.active || t.has_activity())
        .map(Tally::into_entry)
        .collect();
    entries.sort_by(|a, b| {
        b.appointments_booked
            .cmp(&a.appointments_booked)
            .then(b.total_calls.cmp(&a.total_calls))
            .then_with(|| a.agent_name.cmp(&b.agent_name))
    });
    entries
}
