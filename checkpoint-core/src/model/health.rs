/*!
Health state of a person and the disease fate it evolves from.
*/

use serde::{Deserialize, Serialize};

/// Disease timings, in days since infection, drawn once per person
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fate {
    pub start_infectiousness: u32,
    pub end_infectiousness: u32,
    pub start_symptomatic: u32,
    pub end_symptomatic: u32,
}

impl Fate {
    pub fn new(
        start_infectiousness: u32,
        end_infectiousness: u32,
        start_symptomatic: u32,
        end_symptomatic: u32,
    ) -> Self {
        Self {
            start_infectiousness,
            end_infectiousness,
            start_symptomatic,
            end_symptomatic,
        }
    }

    /// Day on which an infection following this fate is over
    pub fn recovery_day(&self) -> u32 {
        self.end_infectiousness.max(self.end_symptomatic)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Susceptible,
    Exposed,
    Infectious,
    Symptomatic,
    InfectiousAndSymptomatic,
    Recovered,
    Immune,
}

/// Health state machine of one person
///
/// The status after `n` calls to [`Health::update`] following
/// [`Health::start_infection`] depends only on the fate and `n`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    fate: Fate,
    status: HealthStatus,
    days_infected: u32,
}

impl Health {
    pub fn new(fate: Fate) -> Self {
        Self {
            fate,
            status: HealthStatus::Susceptible,
            days_infected: 0,
        }
    }

    pub fn fate(&self) -> Fate {
        self.fate
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn start_infectiousness(&self) -> u32 {
        self.fate.start_infectiousness
    }

    pub fn end_infectiousness(&self) -> u32 {
        self.fate.end_infectiousness
    }

    pub fn start_symptomatic(&self) -> u32 {
        self.fate.start_symptomatic
    }

    pub fn end_symptomatic(&self) -> u32 {
        self.fate.end_symptomatic
    }

    /// Days elapsed since the infection started
    pub fn days_infected(&self) -> u32 {
        self.days_infected
    }

    pub fn is_susceptible(&self) -> bool {
        self.status == HealthStatus::Susceptible
    }

    pub fn is_immune(&self) -> bool {
        self.status == HealthStatus::Immune
    }

    pub fn is_recovered(&self) -> bool {
        self.status == HealthStatus::Recovered
    }

    pub fn is_infected(&self) -> bool {
        matches!(
            self.status,
            HealthStatus::Exposed
                | HealthStatus::Infectious
                | HealthStatus::Symptomatic
                | HealthStatus::InfectiousAndSymptomatic
        )
    }

    pub fn is_infectious(&self) -> bool {
        matches!(
            self.status,
            HealthStatus::Infectious | HealthStatus::InfectiousAndSymptomatic
        )
    }

    pub fn is_symptomatic(&self) -> bool {
        matches!(
            self.status,
            HealthStatus::Symptomatic | HealthStatus::InfectiousAndSymptomatic
        )
    }

    pub fn set_immune(&mut self) {
        self.status = HealthStatus::Immune;
    }

    pub fn set_susceptible(&mut self) {
        self.status = HealthStatus::Susceptible;
    }

    pub fn start_infection(&mut self) {
        self.status = HealthStatus::Exposed;
        self.days_infected = 0;
    }

    /// Advance an ongoing infection by one day; no-op otherwise
    pub fn update(&mut self) {
        if !self.is_infected() {
            return;
        }
        self.days_infected += 1;
        self.status = self.status_on_day(self.days_infected);
    }

    fn status_on_day(&self, day: u32) -> HealthStatus {
        if day >= self.fate.recovery_day() {
            return HealthStatus::Recovered;
        }
        let infectious =
            (self.fate.start_infectiousness..self.fate.end_infectiousness).contains(&day);
        let symptomatic = (self.fate.start_symptomatic..self.fate.end_symptomatic).contains(&day);
        match (infectious, symptomatic) {
            (true, true) => HealthStatus::InfectiousAndSymptomatic,
            (true, false) => HealthStatus::Infectious,
            (false, true) => HealthStatus::Symptomatic,
            (false, false) => HealthStatus::Exposed,
        }
    }
}
