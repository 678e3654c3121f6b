use crate::error::{Result, SimulationError};
use crate::sim::body::Body;
use crate::sim::orbital_elements::OrbitalElementSet;
use crate::sim::system::BodySystem;
use crate::sim::units::{Constants, Float, PI};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Stable,
    Unstable,
    Marginal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioMetadata {
    pub scenario: String,
    pub num_planets: usize,
    pub stability: Stability,
    pub resonance_ratio: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Scenario {
    pub bodies: Vec<Body>,
    pub metadata: ScenarioMetadata,
}

impl Scenario {
    pub fn into_system(self, constants: &Constants) -> Result<BodySystem> {
        BodySystem::new(self.bodies, constants.gravitational_constant)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioKind {
    StableTwoBody,
    UnstableThreeBody,
    ResonantTwoPlanet,
    EqualThreeBody,
    RandomMultiPlanet,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 5] = [
        ScenarioKind::StableTwoBody,
        ScenarioKind::UnstableThreeBody,
        ScenarioKind::ResonantTwoPlanet,
        ScenarioKind::EqualThreeBody,
        ScenarioKind::RandomMultiPlanet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::StableTwoBody => "stable_two_body",
            ScenarioKind::UnstableThreeBody => "unstable_three_body",
            ScenarioKind::ResonantTwoPlanet => "resonant_two_planet",
            ScenarioKind::EqualThreeBody => "equal_three_body",
            ScenarioKind::RandomMultiPlanet => "random_multi_planet",
        }
    }

    /// Builds the scenario. `seed` only affects `RandomMultiPlanet`.
    pub fn build(&self, constants: &Constants, seed: u64) -> Result<Scenario> {
        match self {
            ScenarioKind::StableTwoBody => stable_two_body(constants),
            ScenarioKind::UnstableThreeBody => unstable_three_body(constants),
            ScenarioKind::ResonantTwoPlanet => resonant_two_planet(constants),
            ScenarioKind::EqualThreeBody => {
                equal_three_body(constants, constants.astronomical_unit, constants.sun_mass)
            }
            ScenarioKind::RandomMultiPlanet => {
                let mut rng = ChaChaRng::seed_from_u64(seed);
                random_multi_planet(constants, &MultiPlanetParameters::default(), &mut rng)
            }
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = SimulationError;

    fn from_str(name: &str) -> Result<Self> {
        ScenarioKind::ALL
            .iter()
            .find(|kind| kind.name() == name)
            .copied()
            .ok_or_else(|| SimulationError::UnknownScenario(name.to_string()))
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn metadata(
    kind: ScenarioKind,
    num_planets: usize,
    stability: Stability,
    resonance_ratio: Option<&str>,
) -> ScenarioMetadata {
    ScenarioMetadata {
        scenario: kind.name().to_string(),
        num_planets,
        stability,
        resonance_ratio: resonance_ratio.map(str::to_string),
    }
}

fn resting_sun(constants: &Constants) -> Result<Body> {
    Body::new(constants.sun_mass, vec![0., 0.], vec![0., 0.])
}

/// Earth-mass planet on a circular 1 AU orbit.
pub fn stable_two_body(constants: &Constants) -> Result<Scenario> {
    let r = constants.astronomical_unit;
    let v = constants.circular_velocity(constants.sun_mass, r);
    let earth = Body::new(constants.earth_mass, vec![r, 0.], vec![0., v])?;
    Ok(Scenario {
        bodies: vec![resting_sun(constants)?, earth],
        metadata: metadata(ScenarioKind::StableTwoBody, 1, Stability::Stable, None),
    })
}

/// Two opposed 1 AU planets perturbed by a sub-circular rogue at 1.5 AU.
pub fn unstable_three_body(constants: &Constants) -> Result<Scenario> {
    let r = constants.astronomical_unit;
    let v = constants.circular_velocity(constants.sun_mass, r);
    let planet1 = Body::new(constants.earth_mass, vec![r, 0.], vec![0., v])?;
    let planet2 = Body::new(constants.earth_mass, vec![-r, 0.], vec![0., -v])?;
    let r3 = 1.5 * r;
    let v3 = 0.8 * constants.circular_velocity(constants.sun_mass, r3);
    let rogue = Body::new(constants.earth_mass, vec![0., r3], vec![-v3, 0.])?;
    Ok(Scenario {
        bodies: vec![resting_sun(constants)?, planet1, planet2, rogue],
        metadata: metadata(ScenarioKind::UnstableThreeBody, 3, Stability::Unstable, None),
    })
}

/// Planets in 2:1 period resonance.
pub fn resonant_two_planet(constants: &Constants) -> Result<Scenario> {
    let a1 = constants.astronomical_unit;
    let a2 = a1 * (2. as Float).powf(2. / 3.);
    let v1 = constants.circular_velocity(constants.sun_mass, a1);
    let v2 = constants.circular_velocity(constants.sun_mass, a2);
    let planet1 = Body::new(constants.earth_mass, vec![a1, 0.], vec![0., v1])?;
    let planet2 = Body::new(constants.mars_mass, vec![a2, 0.], vec![0., v2])?;
    Ok(Scenario {
        bodies: vec![resting_sun(constants)?, planet1, planet2],
        metadata: metadata(
            ScenarioKind::ResonantTwoPlanet,
            2,
            Stability::Marginal,
            Some("2:1"),
        ),
    })
}

/// Lagrange equilateral solution: three equal masses rotating rigidly about
/// their center of mass.
pub fn equal_three_body(constants: &Constants, side_length: Float, mass: Float) -> Result<Scenario> {
    let r = side_length / (3. as Float).sqrt();
    let omega = (3. * constants.gravitational_constant * mass / side_length.powi(3)).sqrt();
    let bodies = [0., 2. * PI / 3., 4. * PI / 3.]
        .iter()
        .map(|theta: &Float| {
            let (sin, cos) = theta.sin_cos();
            Body::new(
                mass,
                vec![r * cos, r * sin],
                vec![-omega * r * sin, omega * r * cos],
            )
        })
        .collect::<Result<Vec<Body>>>()?;
    Ok(Scenario {
        bodies,
        metadata: metadata(ScenarioKind::EqualThreeBody, 3, Stability::Stable, None),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiPlanetParameters {
    pub star_mass: Float,
    pub n_planets: usize,
    pub a_min: Float,
    pub a_max: Float,
    pub max_eccentricity: Float,
    pub max_inclination: Float,
    /// Planet masses are drawn uniformly from this range, in Earth masses.
    pub mass_range: (Float, Float),
}

impl Default for MultiPlanetParameters {
    fn default() -> Self {
        Self {
            star_mass: Constants::default().sun_mass,
            n_planets: 5,
            a_min: 0.8e11,
            a_max: 3.0e11,
            max_eccentricity: 0.05,
            max_inclination: 2. * PI / 180.,
            mass_range: (0.1, 10.),
        }
    }
}

/// A star with randomly drawn, nearly coplanar planets seeded from orbital
/// elements. All bodies are three dimensional.
pub fn random_multi_planet<R: Rng + ?Sized>(
    constants: &Constants,
    params: &MultiPlanetParameters,
    rng: &mut R,
) -> Result<Scenario> {
    if !(params.a_min > 0. && params.a_max >= params.a_min) {
        return Err(SimulationError::InvalidParameter {
            parameter: "a_min/a_max",
            reason: format!("need 0 < a_min <= a_max, got {} and {}", params.a_min, params.a_max),
        });
    }
    let star = Body::new(params.star_mass, vec![0.; 3], vec![0.; 3])?;
    let mut bodies = vec![star];
    for _ in 0..params.n_planets {
        let mass = constants.earth_mass * rng.gen_range(params.mass_range.0..=params.mass_range.1);
        let elements = OrbitalElementSet::new(
            rng.gen_range(params.a_min..=params.a_max),
            rng.gen_range(0.0..=params.max_eccentricity),
            rng.gen_range(0.0..=params.max_inclination),
            rng.gen_range(0.0..2. * PI),
            rng.gen_range(0.0..2. * PI),
            rng.gen_range(0.0..2. * PI),
            constants.gravitational_constant * (params.star_mass + mass),
        )?;
        bodies.push(Body::from_elements(mass, &elements, &[0.; 3], &[0.; 3])?);
    }
    Ok(Scenario {
        bodies,
        metadata: metadata(
            ScenarioKind::RandomMultiPlanet,
            params.n_planets,
            Stability::Marginal,
            None,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::integrator::{Integrator, Scheme};
    use approx::assert_relative_eq;

    #[test]
    fn scenario_names_round_trip() {
        for kind in ScenarioKind::ALL {
            assert_eq!(kind.name().parse::<ScenarioKind>().unwrap(), kind);
        }
        assert!(matches!(
            "figure_eight".parse::<ScenarioKind>(),
            Err(SimulationError::UnknownScenario(_))
        ));
    }

    #[test]
    fn every_scenario_builds_a_valid_system() {
        let constants = Constants::default();
        for kind in ScenarioKind::ALL {
            let scenario = kind.build(&constants, 7).unwrap();
            assert_eq!(scenario.metadata.scenario, kind.name());
            let system = scenario.into_system(&constants).unwrap();
            assert!(system.len() >= 2);
        }
    }

    #[test]
    fn resonant_planets_have_two_to_one_periods() {
        let constants = Constants::default();
        let scenario = resonant_two_planet(&constants).unwrap();
        let a1 = scenario.bodies[1].position()[0];
        let a2 = scenario.bodies[2].position()[0];
        let ratio = constants.orbital_period(constants.sun_mass, a2)
            / constants.orbital_period(constants.sun_mass, a1);
        assert_relative_eq!(ratio, 2., max_relative = 1e-12);
        assert_eq!(scenario.metadata.resonance_ratio.as_deref(), Some("2:1"));
    }

    #[test]
    fn lagrange_triangle_keeps_its_shape() {
        let constants = Constants {
            gravitational_constant: 1.,
            ..Constants::default()
        };
        let scenario = equal_three_body(&constants, 1., 1.).unwrap();
        let mut system = scenario.into_system(&constants).unwrap();
        let omega = (3. as Float).sqrt();
        let period = 2. * PI / omega;
        Integrator::new(Scheme::Rk4).integrate(&mut system, period / 1000., 1000);
        let bodies = system.bodies();
        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            assert_relative_eq!(bodies[i].distance_to(&bodies[j]), 1., max_relative = 1e-4);
        }
        assert_relative_eq!(bodies[0].position()[0], 1. / omega, max_relative = 1e-3);
    }

    #[test]
    fn random_planets_respect_bounds_and_seed() {
        let constants = Constants::default();
        let params = MultiPlanetParameters::default();
        let build = |seed: u64| {
            random_multi_planet(&constants, &params, &mut ChaChaRng::seed_from_u64(seed)).unwrap()
        };
        let first = build(42);
        let second = build(42);
        assert_eq!(first.bodies, second.bodies);
        assert_eq!(first.bodies.len(), params.n_planets + 1);
        for planet in first.bodies.iter().skip(1) {
            assert_eq!(planet.dimensionality(), 3);
            let distance = planet.distance_to(&first.bodies[0]);
            assert!(distance >= params.a_min * (1. - params.max_eccentricity));
            assert!(distance <= params.a_max * (1. + params.max_eccentricity));
            let inclination_bound = params.max_inclination.sin() * distance;
            assert!(planet.position()[2].abs() <= inclination_bound * 1.0001);
        }
    }

    #[test]
    fn invalid_semi_major_axis_range_is_rejected() {
        let params = MultiPlanetParameters {
            a_min: 2.,
            a_max: 1.,
            ..MultiPlanetParameters::default()
        };
        let mut rng = ChaChaRng::seed_from_u64(1);
        assert!(random_multi_planet(&Constants::default(), &params, &mut rng).is_err());
    }
}
