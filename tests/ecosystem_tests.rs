#![allow(missing_docs)]

use std::collections::HashSet;

use ecosim::simulation::ecosystem::Ecosystem;
use ecosim::simulation::geometry::{length, vec2};
use ecosim::simulation::params::{ConfigError, Params};
use ecosim::simulation::traits::GeneticTraits;

fn create_test_params() -> Params {
    Params {
        seed: Some(1234),
        population_size: 20,
        resource_count: 40,
        ..Params::default()
    }
}

#[test]
fn test_ecosystem_creation() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    assert_eq!(ecosystem.population(), 20);
    assert_eq!(ecosystem.resources().len(), 40);
    assert_eq!(ecosystem.clusters().map(|c| c.len()), Some(3));

    let ids: HashSet<u64> = ecosystem.agents().iter().map(|a| a.id).collect();
    assert_eq!(ids.len(), 20);
    for agent in ecosystem.agents() {
        assert!(agent.parent_ids.is_empty());
        assert_eq!(agent.generation, 0);
    }
}

#[test]
fn test_simulation_step() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let before: Vec<_> = ecosystem.agents().iter().map(|a| (a.pos, a.energy)).collect();

    ecosystem.step();

    assert_eq!(ecosystem.tick_count(), 1);
    for agent in ecosystem.agents() {
        assert_eq!(agent.age, 1);
        assert!(agent.energy <= agent.max_energy());
        assert!((0.0..=100.0).contains(&agent.fitness));
        assert_eq!(agent.rays.len(), agent.traits.rays());
    }
    let after: Vec<_> = ecosystem.agents().iter().map(|a| (a.pos, a.energy)).collect();
    assert_ne!(before, after);
}

#[test]
fn test_old_agents_are_removed() {
    let mut params = create_test_params();
    params.max_age = 50;
    let mut ecosystem = Ecosystem::new(params).unwrap();

    let old: HashSet<u64> = ecosystem
        .agents_mut()
        .iter_mut()
        .step_by(2)
        .map(|agent| {
            agent.age = 49;
            agent.id
        })
        .collect();

    ecosystem.tick();

    assert!(ecosystem.agents().iter().all(|a| !old.contains(&a.id)));
    assert!(ecosystem.agents().iter().all(|a| a.age < 50));
}

#[test]
fn test_starved_agents_are_removed() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let starved = ecosystem.agents()[0].id;
    ecosystem.agents_mut()[0].energy = 0.0;

    ecosystem.tick();

    assert!(ecosystem.agents().iter().all(|a| a.id != starved));
}

#[test]
fn test_population_respects_soft_cap() {
    let mut params = create_test_params();
    params.population_size = 10;
    let mut ecosystem = Ecosystem::new(params).unwrap();
    let fertile_age = ecosystem.params().fertile_age_min;

    for agent in ecosystem.agents_mut() {
        agent.age = fertile_age;
        agent.traits.offspring_count = 1.0;
    }
    for _ in 0..20 {
        ecosystem.tick();
        for agent in ecosystem.agents_mut() {
            agent.energy = agent.max_energy();
            agent.age = agent.age.max(fertile_age);
        }
    }

    // at most one parent's brood past the cap
    let cap = (1.5 * 10.0) as usize;
    assert!(ecosystem.population() <= cap + 4);
    assert!(ecosystem.population() > 10);
}

#[test]
fn test_extinction_recovery_from_gene_pool() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    ecosystem.refresh_gene_pool();
    assert!(!ecosystem.gene_pool().is_empty());

    ecosystem.agents_mut().clear();
    ecosystem.tick();

    assert!(ecosystem.population() > 0);
    let params = ecosystem.params().clone();
    let layout = ecosystem.clusters().unwrap();
    for agent in ecosystem.agents() {
        let cluster = layout.get(agent.cluster.unwrap()).unwrap();
        assert!(length(agent.pos - cluster.center) <= cluster.radius + 1e-3);
        assert!((agent.energy - params.emergency_energy_fraction * agent.max_energy()).abs() < 1e-3);
        assert!(agent.age > params.fertile_age_min);
    }
}

#[test]
fn test_extinction_recovery_uses_every_cluster_elite() {
    let mut params = create_test_params();
    params.population_size = 60;
    let mut ecosystem = Ecosystem::new(params).unwrap();
    for (i, agent) in ecosystem.agents_mut().iter_mut().enumerate() {
        agent.fitness = i as f32;
    }
    ecosystem.refresh_gene_pool();
    let templates = ecosystem.gene_pool().templates().to_vec();
    assert_eq!(templates.len(), 12);

    ecosystem.agents_mut().clear();
    ecosystem.tick();

    assert_eq!(ecosystem.population(), 15);
    for template in &templates {
        assert!(
            ecosystem.agents().iter().any(|a| a.brain == template.brain && a.traits == template.traits),
            "template of fitness {} was not respawned",
            template.fitness
        );
    }

    let agents = ecosystem.agents();
    let distinct = agents
        .iter()
        .enumerate()
        .filter(|(i, a)| agents[..*i].iter().all(|b| b.brain != a.brain))
        .count();
    assert_eq!(distinct, 15);
}

#[test]
fn test_diversity_injection_clones_a_survivor() {
    let mut params = create_test_params();
    params.diversity_injection_chance = 1.0;
    let mut ecosystem = Ecosystem::new(params).unwrap();
    ecosystem.agents_mut().truncate(3);
    let survivors: Vec<_> = ecosystem.agents().to_vec();

    ecosystem.tick();

    assert_eq!(ecosystem.population(), 4);
    let clone = ecosystem
        .agents()
        .iter()
        .find(|a| survivors.iter().all(|s| s.id != a.id))
        .unwrap();
    assert_eq!(clone.parent_ids.len(), 1);
    let source = survivors.iter().find(|s| s.id == clone.parent_ids[0]).unwrap();
    assert_eq!(clone.generation, source.generation + 1);
    assert_eq!(clone.species, source.species);
    assert_eq!(clone.cluster, source.cluster);
    assert_ne!(clone.brain, source.brain);
    assert_ne!(clone.traits, source.traits);
}

#[test]
fn test_extinction_recovery_without_gene_pool_founds_species() {
    let mut ecosystem = Ecosystem::empty(create_test_params()).unwrap();
    ecosystem.tick();

    assert_eq!(ecosystem.population(), 5);
    assert!(!ecosystem.species().is_empty());
}

#[test]
fn test_extinction_without_layout_is_deferred() {
    let mut params = create_test_params();
    params.clusters = None;
    let mut ecosystem = Ecosystem::empty(params).unwrap();
    ecosystem.tick();
    assert_eq!(ecosystem.population(), 0);
}

#[test]
fn test_species_census_prunes_empty_species() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    assert_eq!(ecosystem.species().len(), 4);

    let keep = ecosystem.agents()[0].species;
    ecosystem.agents_mut().retain(|a| a.species == keep);
    ecosystem.tick();

    assert_eq!(ecosystem.species().len(), 1);
    assert_eq!(ecosystem.species().get(keep).map(|s| s.population), Some(5));
}

#[test]
fn test_inserted_agents_keep_ids_unique() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let traits = GeneticTraits::from_defaults(&ecosystem.params().traits);
    let mut agent = ecosystem.new_agent(traits.clone(), 0, vec2(0.0, 0.0));
    agent.id = 1000;
    ecosystem.insert_agent(agent);
    let next = ecosystem.new_agent(traits, 0, vec2(0.0, 0.0));
    assert!(next.id > 1000);
}

#[test]
fn test_snapshot_exposes_public_fields() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    ecosystem.step();
    let views = ecosystem.snapshot();
    assert_eq!(views.len(), ecosystem.population());

    let json = serde_json::to_value(&views[0]).unwrap();
    for key in [
        "id",
        "parentIds",
        "species",
        "generation",
        "position",
        "heading",
        "energy",
        "fitness",
        "age",
        "geneticTraits",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn test_long_run_stays_consistent() {
    let mut params = create_test_params();
    params.stats_interval = 10;
    let mut ecosystem = Ecosystem::new(params).unwrap();
    for _ in 0..100 {
        ecosystem.step();
        for agent in ecosystem.agents() {
            assert!(agent.energy >= 0.0 && agent.energy <= agent.max_energy());
            assert!((0.0..=100.0).contains(&agent.fitness));
            assert!(agent.parent_ids.len() <= 2);
        }
    }
    assert!(ecosystem.history().len() <= 10);
}

#[test]
fn test_degenerate_trait_range_is_rejected() {
    let mut params = create_test_params();
    params.traits.hue.min = 10.0;
    params.traits.hue.max = 10.0;
    params.traits.hue.default = 10.0;
    assert!(matches!(
        Ecosystem::new(params),
        Err(ConfigError::TraitRange { .. })
    ));
}

#[test]
fn test_invalid_probability_is_rejected() {
    let mut params = create_test_params();
    params.sexual_reproduction_chance = 1.5;
    assert!(matches!(
        Ecosystem::new(params),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_params_from_json() {
    let params = Params::from_json_str(r#"{ "population_size": 5, "clusters": null }"#).unwrap();
    assert_eq!(params.population_size, 5);
    assert!(params.clusters.is_none());
    assert_eq!(params.max_age, Params::default().max_age);

    assert!(Params::from_json_str(r#"{ "population_size": 0 }"#).is_err());
    assert!(matches!(
        Params::from_json_str("not json"),
        Err(ConfigError::Parse(_))
    ));
}
