#![allow(missing_docs)]

use ecosim::simulation::agent::Agent;
use ecosim::simulation::geometry::{Vec2, vec2};
use ecosim::simulation::params::Params;
use ecosim::simulation::perception::{RayHit, WorldView, cast_rays, encode_inputs, input_size};
use ecosim::simulation::resource::Resource;
use ecosim::simulation::spatial::SpatialIndex;
use ecosim::simulation::traits::GeneticTraits;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn create_agent(id: u64, pos: Vec2, heading: f32, params: &Params, rng: &mut StdRng) -> Agent {
    let mut traits = GeneticTraits::from_defaults(&params.traits);
    traits.ray_count = 1.0;
    traits.ray_length = 100.0;
    traits.body_size = 10.0;
    let mut agent = Agent::new(id, traits, 0, pos, params, rng);
    agent.heading = heading;
    agent
}

fn world<'a>(
    agents: &'a [Agent],
    resources: &'a [Resource],
    index: Option<&'a SpatialIndex>,
) -> WorldView<'a> {
    WorldView {
        agents,
        resources,
        width: 1000.0,
        height: 1000.0,
        index,
    }
}

#[test]
fn test_ray_hits_agent_outline() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(1);
    let agents = vec![
        create_agent(0, vec2(0.0, 0.0), 0.0, &params, &mut rng),
        // 10 wide, 15 long, so its near edge sits at y = 42.5
        create_agent(1, vec2(0.0, 50.0), 0.0, &params, &mut rng),
    ];

    let hits = cast_rays(&agents[0], &world(&agents, &[], None));
    assert_eq!(hits.len(), 1);
    assert!((hits[0].obstacle.unwrap() - 0.425).abs() < 1e-4);
    assert_eq!(hits[0].resource, None);
}

#[test]
fn test_ray_ignores_own_outline() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(1);
    let agents = vec![create_agent(0, vec2(0.0, 0.0), 0.0, &params, &mut rng)];
    let hits = cast_rays(&agents[0], &world(&agents, &[], None));
    assert_eq!(hits, vec![RayHit::default()]);
}

#[test]
fn test_ray_hits_resource_circle() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(1);
    let agents = vec![create_agent(0, vec2(0.0, 0.0), 0.0, &params, &mut rng)];
    let resources = vec![Resource::new(vec2(0.0, 20.0), 5.0, 10.0)];

    let hits = cast_rays(&agents[0], &world(&agents, &resources, None));
    assert!((hits[0].resource.unwrap() - 0.15).abs() < 1e-4);
}

#[test]
fn test_closer_resource_wins_the_input() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(1);
    let agents = vec![
        create_agent(0, vec2(0.0, 0.0), 0.0, &params, &mut rng),
        create_agent(1, vec2(0.0, 50.0), 0.0, &params, &mut rng),
    ];
    let resources = vec![Resource::new(vec2(0.0, 20.0), 5.0, 10.0)];

    let hits = cast_rays(&agents[0], &world(&agents, &resources, None));
    assert!(hits[0].obstacle.is_some());
    assert!(hits[0].resource.is_some());

    let inputs = encode_inputs(&agents[0], &hits, 1000.0, 1000.0);
    assert_eq!(inputs.len(), input_size(1));
    assert_eq!(inputs[3], 0.0);
    assert!((inputs[4] - 0.85).abs() < 1e-4);
}

#[test]
fn test_ray_facing_away_sees_nothing() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(1);
    let agents = vec![
        create_agent(0, vec2(0.0, 0.0), std::f32::consts::PI, &params, &mut rng),
        create_agent(1, vec2(0.0, 50.0), 0.0, &params, &mut rng),
    ];
    let resources = vec![Resource::new(vec2(0.0, 20.0), 5.0, 10.0)];

    let hits = cast_rays(&agents[0], &world(&agents, &resources, None));
    assert_eq!(hits, vec![RayHit::default()]);
}

#[test]
fn test_spatial_index_agrees_with_exhaustive_search() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(9);
    let agents: Vec<Agent> = (0..30)
        .map(|i| {
            let pos = vec2((i % 6) as f32 * 40.0 - 100.0, (i / 6) as f32 * 40.0 - 100.0);
            let mut agent = create_agent(i, pos, i as f32 * 0.7, &params, &mut rng);
            agent.traits.ray_count = 7.0;
            agent.traits.field_of_view = 3.0;
            agent
        })
        .collect();
    let resources: Vec<Resource> = (0..20)
        .map(|i| Resource::new(vec2(i as f32 * 13.0 - 120.0, 15.0 - i as f32 * 7.0), 4.0, 10.0))
        .collect();
    let index = SpatialIndex::build(&agents, &resources).unwrap();

    for agent in &agents {
        let exhaustive = cast_rays(agent, &world(&agents, &resources, None));
        let indexed = cast_rays(agent, &world(&agents, &resources, Some(&index)));
        assert_eq!(exhaustive, indexed);
    }
}

#[test]
fn test_inputs_encode_pose() {
    let params = Params::default();
    let mut rng = StdRng::seed_from_u64(1);
    let agent = create_agent(0, vec2(250.0, -500.0), std::f32::consts::PI, &params, &mut rng);
    let inputs = encode_inputs(&agent, &[RayHit::default()], 1000.0, 1000.0);
    assert!((inputs[0] - 0.5).abs() < 1e-6);
    assert!((inputs[1] + 1.0).abs() < 1e-6);
    assert!((inputs[2] - 0.5).abs() < 1e-6);
}
