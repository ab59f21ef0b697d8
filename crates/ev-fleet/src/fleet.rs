//! The `Fleet`: every ambulance plus its mission state.

use ev_core::{AmbulanceId, AmbulancePhase, AmbulanceStatus, GeoPoint, SimClock, Tick};
use ev_spatial::MissionPlan;

use crate::ambulance::Ambulance;
use crate::mission::{DispatchOutcome, LegEvent, Mission};
use crate::{FleetError, FleetResult};

/// All ambulances, indexed by `AmbulanceId`.
///
/// Per-ambulance columns (`missions`, `plans`, ...) are parallel vectors of
/// the same length.
#[derive(Debug, Default)]
pub struct Fleet {
    ambulances: Vec<Ambulance>,
    missions: Vec<Option<Mission>>,
    plans: Vec<MissionPlan>,
    dispatched_at: Vec<Option<Tick>>,
    etas: Vec<Option<f64>>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an idle ambulance at `home`.  Ids are sequential from 0.
    pub fn add(&mut self, home: GeoPoint, speed_m_per_tick: f64) -> FleetResult<AmbulanceId> {
        if !(speed_m_per_tick.is_finite() && speed_m_per_tick > 0.0) {
            return Err(FleetError::InvalidSpeed(speed_m_per_tick));
        }
        let id = AmbulanceId(self.ambulances.len() as u32);
        self.ambulances.push(Ambulance::new(id, home, speed_m_per_tick));
        self.missions.push(None);
        self.plans.push(MissionPlan::default());
        self.dispatched_at.push(None);
        self.etas.push(None);
        Ok(id)
    }

    /// Attach a mission to be dispatched at `mission.dispatch_tick`.
    pub fn assign(&mut self, id: AmbulanceId, mission: Mission) -> FleetResult<()> {
        let slot = self.missions.get_mut(id.index()).ok_or(FleetError::AmbulanceNotFound(id))?;
        *slot = Some(mission);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.ambulances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ambulances.is_empty()
    }

    pub fn get(&self, id: AmbulanceId) -> Option<&Ambulance> {
        self.ambulances.get(id.index())
    }

    pub fn ambulances(&self) -> &[Ambulance] {
        &self.ambulances
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ambulance> {
        self.ambulances.iter()
    }

    pub fn mission(&self, id: AmbulanceId) -> Option<&Mission> {
        self.missions.get(id.index()).and_then(Option::as_ref)
    }

    pub fn plan(&self, id: AmbulanceId) -> Option<&MissionPlan> {
        self.plans.get(id.index())
    }

    /// Waypoints of the leg `id` is currently driving; empty when idle.
    pub fn active_route(&self, id: AmbulanceId) -> &[GeoPoint] {
        let (Some(a), Some(plan)) = (self.ambulances.get(id.index()), self.plans.get(id.index())) else {
            return &[];
        };
        match a.phase {
            AmbulancePhase::ToPatient  => &plan.to_patient.waypoints,
            AmbulancePhase::ToHospital => &plan.to_hospital.waypoints,
            AmbulancePhase::Idle       => &[],
        }
    }

    /// Ambulances that are RESPONDING or TRANSPORTING, ascending id.
    pub fn active_ids(&self) -> Vec<AmbulanceId> {
        self.ambulances.iter().filter(|a| a.is_active()).map(|a| a.id).collect()
    }

    /// Idle ambulances whose mission is due at `now` and not yet dispatched.
    pub fn due_dispatches(&self, now: Tick) -> Vec<AmbulanceId> {
        self.ambulances
            .iter()
            .filter(|a| {
                let i = a.id.index();
                !a.is_active()
                    && self.dispatched_at[i].is_none()
                    && self.missions[i].is_some_and(|m| m.dispatch_tick == now)
            })
            .map(|a| a.id)
            .collect()
    }

    /// Measured mission time (dispatch to hospital arrival) in seconds.
    pub fn eta_secs(&self, id: AmbulanceId) -> Option<f64> {
        self.etas.get(id.index()).copied().flatten()
    }

    pub fn dispatched_at(&self, id: AmbulanceId) -> Option<Tick> {
        self.dispatched_at.get(id.index()).copied().flatten()
    }

    /// `true` once every ambulance with a mission has finished or failed it.
    pub fn all_settled(&self) -> bool {
        self.ambulances.iter().all(|a| {
            let i = a.id.index();
            !a.is_active() && (self.missions[i].is_none() || self.dispatched_at[i].is_some())
        })
    }

    // ── Mission lifecycle ─────────────────────────────────────────────────

    /// Start `plan` for ambulance `id` at `now`.
    ///
    /// An empty to-patient leg leaves the ambulance idle at its current
    /// position and returns [`DispatchOutcome::NoRoute`].
    ///
    /// The ambulance is placed on the leg's first waypoint without driving
    /// there, which assumes it is parked at its station (`home`).
    pub fn dispatch(&mut self, id: AmbulanceId, plan: MissionPlan, now: Tick) -> FleetResult<DispatchOutcome> {
        let a = self.ambulances.get_mut(id.index()).ok_or(FleetError::AmbulanceNotFound(id))?;
        if a.is_active() {
            return Err(FleetError::AlreadyDispatched(id));
        }
        self.dispatched_at[id.index()] = Some(now);

        let Some(&start) = plan.to_patient.waypoints.first() else {
            log::warn!("{id} has no route to its patient; staying idle");
            self.plans[id.index()] = plan;
            return Ok(DispatchOutcome::NoRoute);
        };
        a.position = start;
        a.waypoint_index = 1;
        a.phase = AmbulancePhase::ToPatient;
        a.status = AmbulanceStatus::Responding;
        self.plans[id.index()] = plan;
        log::info!("{id} dispatched at {now}");
        Ok(DispatchOutcome::Dispatched)
    }

    /// Move ambulance `id` by one tick and handle leg completion.
    ///
    /// Idle ambulances do not move.  Returns the leg transition this tick
    /// produced, if any.
    pub fn step(&mut self, id: AmbulanceId, clock: &SimClock) -> FleetResult<Option<LegEvent>> {
        let i = id.index();
        let a = self.ambulances.get_mut(i).ok_or(FleetError::AmbulanceNotFound(id))?;
        let plan = &self.plans[i];
        let route = match a.phase {
            AmbulancePhase::ToPatient  => &plan.to_patient.waypoints,
            AmbulancePhase::ToHospital => &plan.to_hospital.waypoints,
            AmbulancePhase::Idle       => return Ok(None),
        };

        if a.waypoint_index < route.len() && a.advance(route).reached {
            a.waypoint_index += 1;
        }
        if a.waypoint_index < route.len() {
            return Ok(None);
        }

        // Leg complete.  Time counts the tick just driven.
        let now = clock.current_tick + 1;
        let elapsed_secs = self.dispatched_at[i].map_or(0.0, |d| clock.secs_between(d, now));
        let event = match a.phase {
            AmbulancePhase::ToPatient => {
                if plan.to_hospital.waypoints.is_empty() {
                    log::warn!("{id} reached patient but hospital is unreachable");
                    a.phase = AmbulancePhase::Idle;
                    a.status = AmbulanceStatus::Idle;
                    LegEvent::Stalled { ambulance: id }
                } else {
                    a.phase = AmbulancePhase::ToHospital;
                    a.status = AmbulanceStatus::Transporting;
                    a.waypoint_index = 1;
                    log::info!("{id} reached patient after {elapsed_secs:.1} s");
                    LegEvent::ReachedPatient { ambulance: id, elapsed_secs }
                }
            }
            AmbulancePhase::ToHospital | AmbulancePhase::Idle => {
                a.phase = AmbulancePhase::Idle;
                a.status = AmbulanceStatus::Idle;
                self.etas[i] = Some(elapsed_secs);
                log::info!("{id} reached hospital: mission time {elapsed_secs:.1} s");
                LegEvent::ReachedHospital { ambulance: id, eta_secs: elapsed_secs }
            }
        };
        Ok(Some(event))
    }

    /// Return every ambulance to its home, idle, and forget plans and ETAs.
    /// Missions stay assigned so the run can be repeated.
    pub fn reset(&mut self) {
        for a in &mut self.ambulances {
            a.go_home();
        }
        for p in &mut self.plans {
            *p = MissionPlan::default();
        }
        self.dispatched_at.fill(None);
        self.etas.fill(None);
    }
}
