pub mod authority;
pub mod bucket;
pub mod config;
pub mod metrics;
pub mod names;
pub mod pipeline;
pub mod reconcile;
pub mod registry;
pub mod resolver;
pub mod sgcn;
pub mod testing;

pub use authority::{
    AphiaRecord, AuthorityError, ConservationAuthority, ConservationStatus, ItisClient,
    ItisConfig, ItisDoc, ListingAuthority, MatchCandidate, NatureServeClient, NatureServeConfig,
    SpeciesDocResult, TaxonAuthority, TessClient, TessConfig, TessDetail, TessOutcome,
    WormsClient, WormsConfig,
};
pub use bucket::{
    BucketColumn, BucketEncoding, CacheBucket, HierarchyLevel, ItisBucket, NatureServeBucket,
    SgcnBucket, TessBucket, VernacularName, WormsBucket,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PipelineConfig,
    SanitizedConfig, SgcnConfig,
};
pub use names::{clean_text, normalize, LookupField, SearchTerm};
pub use pipeline::{PipelineError, PipelineRunner, PipelineStep, RunContext, RunSummary};
pub use reconcile::{reconcile, CanonicalFields, ReconcileInput};
pub use registry::{
    Gc2Registry, LookupProperty, RegistryConfig, RegistryError, RegistryStore, TirRecord,
};
pub use resolver::{AuthorityFailure, MatchMethod, MatchOutcome, MatchResolver, SearchStage};
pub use sgcn::{ReferenceList, SgcnAnnotator, TaxonomicGroupMap};
