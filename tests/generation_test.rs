use async_trait::async_trait;
use chrono::NaiveDate;
use fraudring::backend::{EmbeddedBackend, EntitySummary, GraphBackend, GraphStats, IndexSpec};
use fraudring::graph::{GraphStore, Label, NodeId, PropertyMap};
use fraudring::model::{NodeRef, NodeSpec, Rel};
use fraudring::{
    AggregateQuery, FraudRingError, FraudRingResult, GeneratorConfig, Generator, GraphQuery, QueryResult, ResultValue,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

async fn generated(seed: u64) -> (Arc<EmbeddedBackend>, Generator) {
    let backend = Arc::new(EmbeddedBackend::new());
    let generator = Generator::new(backend.clone(), GeneratorConfig::seeded(seed)).with_today(today());
    generator.generate_all().await.unwrap();
    (backend, generator)
}

fn id_of(store: &GraphStore, node: NodeId) -> String {
    store
        .get_node(node)
        .and_then(|n| n.external_id())
        .unwrap_or_default()
        .to_string()
}

/// Outgoing edges of `node` with type `rel`, as far-end external ids
fn out(store: &GraphStore, node: NodeId, rel: &str) -> Vec<String> {
    store
        .outgoing(node)
        .into_iter()
        .filter(|e| e.edge_type.as_str() == rel)
        .map(|e| id_of(store, e.target))
        .collect()
}

#[tokio::test]
async fn test_generation_stats() {
    let backend = Arc::new(EmbeddedBackend::new());
    let generator = Generator::new(backend.clone(), GeneratorConfig::seeded(11)).with_today(today());
    let stats = generator.generate_all().await.unwrap();

    let steps: Vec<(&str, usize)> = stats.iter().collect();
    assert_eq!(
        steps,
        vec![
            ("background_claims", 150),
            ("scenario_1_claims", 47),
            ("scenario_2_claims", 6),
            ("scenario_3a_claims", 43),
            ("scenario_3b_claims", 32),
            ("scenario_4_claims", 49),
        ]
    );

    let graph = backend.stats().await.unwrap();
    assert_eq!(graph.claims as usize, stats.total());
    assert_eq!(graph.fraud_claims, 15);
}

#[tokio::test]
async fn test_background_claims_are_bounded() {
    let (backend, generator) = generated(3).await;
    let config = generator.config().clone();
    let store = backend.store().read().await;

    let mut provider_load: HashMap<String, usize> = HashMap::new();
    let mut attorney_load: HashMap<String, usize> = HashMap::new();
    let mut background = 0;
    for claim in store.nodes_by_label(&Label::new("Claim")) {
        let id = claim.external_id().unwrap_or_default();
        if !id.starts_with("CLM_BG_") {
            continue;
        }
        background += 1;
        assert!(claim.get_property("scenario").is_none());
        assert_eq!(out(&store, claim.id, "FILED_BY").len(), 1, "{}", id);
        assert_eq!(out(&store, claim.id, "HANDLED_BY").len(), 1, "{}", id);

        let providers = out(&store, claim.id, "TREATED_AT");
        assert_eq!(providers.len(), 1);
        *provider_load.entry(providers[0].clone()).or_default() += 1;

        let attorneys = out(&store, claim.id, "REPRESENTED_BY");
        assert!(attorneys.len() <= 1);
        for attorney in attorneys {
            *attorney_load.entry(attorney).or_default() += 1;
        }
    }
    assert_eq!(background, config.background_claims);

    assert_eq!(provider_load.len(), config.providers);
    assert!(provider_load.values().all(|&n| (3..=8).contains(&n)), "{:?}", provider_load);
    assert_eq!(attorney_load.values().sum::<usize>(), config.represented_claims());
    assert!(attorney_load.values().all(|&n| (2..=6).contains(&n)), "{:?}", attorney_load);
}

#[tokio::test]
async fn test_background_households_unique_except_couples() {
    let (backend, generator) = generated(8).await;
    let config = generator.config().clone();
    let store = backend.store().read().await;

    let mut phones: HashMap<String, usize> = HashMap::new();
    let mut homes: HashMap<String, Vec<NodeId>> = HashMap::new();
    for claim in store.nodes_by_label(&Label::new("Claim")) {
        if !claim.external_id().unwrap_or_default().starts_with("CLM_BG_") {
            continue;
        }
        let claimant = store
            .outgoing(claim.id)
            .into_iter()
            .find(|e| e.edge_type.as_str() == "FILED_BY")
            .map(|e| e.target)
            .unwrap();
        for phone in out(&store, claimant, "HAS_PHONE") {
            *phones.entry(phone).or_default() += 1;
        }
        for home in out(&store, claimant, "LIVES_AT") {
            homes.entry(home).or_default().push(claimant);
        }
    }

    assert_eq!(phones.len(), config.background_claims);
    assert!(phones.values().all(|&n| n == 1));

    let shared: Vec<&Vec<NodeId>> = homes.values().filter(|people| people.len() > 1).collect();
    assert_eq!(config.couples(), 7);
    assert_eq!(shared.len(), config.couples());
    let married = |a: NodeId, b: NodeId| out(&store, a, "MARRIED_TO").contains(&id_of(&store, b));
    for people in shared {
        assert_eq!(people.len(), 2);
        assert!(married(people[0], people[1]) || married(people[1], people[0]));
    }
}

#[tokio::test]
async fn test_scenario_cardinalities() {
    let (backend, _) = generated(5).await;
    let store = backend.store().read().await;

    let node = |id: &str| store.node_by_external_id(id).map(|n| n.id).unwrap();
    let incoming = |id: &str, rel: &str| {
        store
            .incoming(node(id))
            .into_iter()
            .filter(|e| e.edge_type.as_str() == rel)
            .count()
    };

    assert_eq!(incoming("ATT_S1_WEBB", "REPRESENTED_BY"), 47);
    assert_eq!(incoming("PROV_S1_WELLNESS", "TREATED_AT"), 22);
    assert_eq!(incoming("PROV_S1_PEAK", "TREATED_AT"), 19);
    assert_eq!(incoming("P_S1_MARIA", "WITNESSED_BY"), 8);

    assert_eq!(incoming("PH_S2_MAIN", "HAS_PHONE"), 5);
    assert_eq!(incoming("PH_S2_ALT", "HAS_PHONE"), 2);
    assert_eq!(incoming("ADDR_S2_OAK", "LIVES_AT"), 5);

    assert_eq!(incoming("PROV_S3_SUNRISE", "TREATED_AT"), 28);
    assert_eq!(incoming("PROV_S3_PEAK", "TREATED_AT"), 15);
    assert_eq!(incoming("ATT_S3_VEGA", "REPRESENTED_BY"), 35);
    assert_eq!(incoming("P_S3_CARMEN", "WITNESSED_BY"), 6);
    assert_eq!(incoming("PH_S3_SHARED", "HAS_PHONE"), 7);
    assert_eq!(incoming("PROV_S3_CITYGEN", "TREATED_AT"), 32);
    assert_eq!(incoming("LOC_S3_I85", "OCCURRED_AT"), 32);

    assert_eq!(incoming("PROV_S4_BERNARD", "TREATED_AT"), 15);
    assert_eq!(incoming("ATT_S4_CHEN", "REPRESENTED_BY"), 46);
    assert_eq!(incoming("PROV_S4_RAPID", "TREATED_AT"), 28);
    assert_eq!(out(&store, node("P_S4_SIMMONS"), "FORMER_EMPLOYEE_OF"), vec!["PROV_S4_BERNARD"]);
    assert_eq!(out(&store, node("PROV_S4_RAPID"), "OWNED_BY"), vec!["P_S4_SIMMONS"]);
}

#[tokio::test]
async fn test_city_general_claimants_keep_apart() {
    let (backend, _) = generated(9).await;
    let store = backend.store().read().await;
    let city_general = store.node_by_external_id("PROV_S3_CITYGEN").unwrap().id;

    let mut phones: HashMap<String, usize> = HashMap::new();
    let mut homes: HashMap<String, usize> = HashMap::new();
    for edge in store.incoming(city_general) {
        let claimant = out(&store, edge.source, "FILED_BY");
        let person = store.node_by_external_id(&claimant[0]).unwrap().id;
        for phone in out(&store, person, "HAS_PHONE") {
            *phones.entry(phone).or_default() += 1;
        }
        for home in out(&store, person, "LIVES_AT") {
            *homes.entry(home).or_default() += 1;
        }
    }
    assert_eq!(phones.len(), 32);
    assert!(phones.values().all(|&n| n == 1));
    let shared: Vec<&String> = homes.iter().filter(|(_, &n)| n > 1).map(|(k, _)| k).collect();
    assert_eq!(shared.len(), 2);
    assert!(shared.iter().all(|id| id.starts_with("ADDR_S3_COUPLE_")));
}

#[tokio::test]
async fn test_regeneration_is_idempotent() {
    let backend = Arc::new(EmbeddedBackend::new());
    let generator = Generator::new(backend.clone(), GeneratorConfig::default()).with_today(today());

    let first = generator.generate_all().await.unwrap();
    let first_graph = backend.stats().await.unwrap();
    let second = generator.generate_all().await.unwrap();
    let second_graph = backend.stats().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first_graph.claims, second_graph.claims);
    assert_eq!(first_graph.fraud_claims, second_graph.fraud_claims);
}

#[tokio::test]
async fn test_same_seed_same_graph() {
    let (a, _) = generated(42).await;
    let (b, _) = generated(42).await;
    let names = |store: &GraphStore| -> Vec<String> {
        store
            .nodes_by_label(&Label::new("Person"))
            .iter()
            .filter_map(|n| n.get_property("name").map(|v| v.to_string()))
            .collect()
    };
    let (a, b) = (a.store().read().await, b.store().read().await);
    assert_eq!(names(&a), names(&b));
    assert_eq!(a.node_count(), b.node_count());
    assert_eq!(a.edge_count(), b.edge_count());
}

#[tokio::test]
async fn test_concurrent_runs_do_not_interleave() {
    let backend = Arc::new(EmbeddedBackend::new());
    let generator = Arc::new(Generator::new(backend.clone(), GeneratorConfig::seeded(1)).with_today(today()));

    let (a, b) = tokio::join!(
        {
            let g = generator.clone();
            async move { g.generate_all().await }
        },
        {
            let g = generator.clone();
            async move { g.generate_all().await }
        }
    );
    assert_eq!(a.unwrap().total(), 327);
    assert_eq!(b.unwrap().total(), 327);
    assert_eq!(backend.stats().await.unwrap().claims, 327);
}

#[tokio::test]
async fn test_clear_leaves_nothing_behind() {
    let (backend, _) = generated(2).await;
    backend.clear().await.unwrap();
    let stats = backend.stats().await.unwrap();
    assert_eq!(stats.total_nodes, 0);
    assert_eq!(stats.total_relationships, 0);
    assert!(backend.labels().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_config_rejected_before_clearing() {
    let (backend, _) = generated(4).await;
    let before = backend.stats().await.unwrap();

    let config = GeneratorConfig {
        providers: 5,
        ..GeneratorConfig::seeded(4)
    };
    let err = Generator::new(backend.clone(), config).generate_all().await.unwrap_err();
    assert!(matches!(err, FraudRingError::ConfigError(_)));
    assert_eq!(backend.stats().await.unwrap(), before);
}

/// Embedded backend that refuses node creation once `budget` nodes exist
struct FailingBackend {
    inner: EmbeddedBackend,
    budget: AtomicUsize,
}

#[async_trait]
impl GraphBackend for FailingBackend {
    fn describe(&self) -> String {
        "failing embedded store".to_string()
    }

    async fn create(&self, spec: NodeSpec) -> FraudRingResult<()> {
        if self
            .budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
        {
            return Err(FraudRingError::QueryError("write refused".to_string()));
        }
        self.inner.create(spec).await
    }

    async fn connect(&self, from: &NodeRef, rel: Rel, to: &NodeRef) -> FraudRingResult<()> {
        self.inner.connect(from, rel, to).await
    }

    async fn create_index(&self, index: &IndexSpec) -> FraudRingResult<()> {
        self.inner.create_index(index).await
    }

    async fn clear(&self) -> FraudRingResult<()> {
        self.inner.clear().await
    }

    async fn query(&self, query: &GraphQuery) -> FraudRingResult<QueryResult> {
        self.inner.query(query).await
    }

    async fn aggregate(&self, query: &AggregateQuery) -> FraudRingResult<ResultValue> {
        self.inner.aggregate(query).await
    }

    async fn ping(&self) -> FraudRingResult<()> {
        self.inner.ping().await
    }

    async fn stats(&self) -> FraudRingResult<GraphStats> {
        self.inner.stats().await
    }

    async fn labels(&self) -> FraudRingResult<Vec<String>> {
        self.inner.labels().await
    }

    async fn entities(&self, label: &str) -> FraudRingResult<Vec<EntitySummary>> {
        self.inner.entities(label).await
    }
}

#[tokio::test]
async fn test_regeneration_after_failed_run_converges() {
    let store = Arc::new(RwLock::new(GraphStore::new()));
    let failing = Arc::new(FailingBackend {
        inner: EmbeddedBackend::with_store(store.clone()),
        budget: AtomicUsize::new(400),
    });
    let err = Generator::new(failing, GeneratorConfig::seeded(6))
        .with_today(today())
        .generate_all()
        .await
        .unwrap_err();
    assert!(matches!(err, FraudRingError::QueryError(_)));
    assert_eq!(store.read().await.node_count(), 400);

    let mut stray = PropertyMap::new();
    stray.insert("id".to_string(), "CLM_STRAY".into());
    store
        .write()
        .await
        .create_node(vec![Label::new("Claim")], stray)
        .unwrap();

    let backend = Arc::new(EmbeddedBackend::with_store(store.clone()));
    let stats = Generator::new(backend.clone(), GeneratorConfig::seeded(6))
        .with_today(today())
        .generate_all()
        .await
        .unwrap();
    assert_eq!(stats.total(), 327);
    assert_eq!(stats.get("scenario_1_claims"), Some(47));
    assert_eq!(stats.get("scenario_4_claims"), Some(49));

    let graph = backend.stats().await.unwrap();
    assert_eq!(graph.claims, 327);
    assert_eq!(graph.fraud_claims, 15);

    let (reference, _) = generated(6).await;
    let (after, fresh) = (store.read().await, reference.store().read().await);
    assert!(after.node_by_external_id("CLM_STRAY").is_none());
    assert_eq!(after.node_count(), fresh.node_count());
    assert_eq!(after.edge_count(), fresh.edge_count());

    let webb = after.node_by_external_id("ATT_S1_WEBB").unwrap().id;
    let represented = after
        .incoming(webb)
        .into_iter()
        .filter(|e| e.edge_type.as_str() == "REPRESENTED_BY")
        .count();
    assert_eq!(represented, 47);
    let rapid = after.node_by_external_id("PROV_S4_RAPID").unwrap().id;
    assert_eq!(out(&after, rapid, "OWNED_BY"), vec!["P_S4_SIMMONS"]);
}
