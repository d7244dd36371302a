/*============================================================
  Synavera Project: Syn-Plug
  Module: synplug_core::registry
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Map tracked-entry type tags to concrete source provider
    constructors.

  Security / Safety Notes:
    The provider set is fixed at compile time; no dynamic
    discovery or loading ever occurs.

  Dependencies:
    The concrete provider modules only.

  Operational Scope:
    Consulted wherever a tracked entry must become a live
    provider: add, check, and update flows.

  Revision History:
    2026-05-17 COD  Authored static provider table.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Closed registry, deterministic resolution
    - Case-insensitive operator input, exact internal tags
    - Constructor validation before any network traffic
============================================================*/

use std::path::Path;

use crate::error::{Result, SynplugError};
use crate::github::GithubProvider;
use crate::jenkins::JenkinsProvider;
use crate::modrinth::ModrinthProvider;
use crate::provider::{Provider, SourceContext, SourceProvider};
use crate::spiget::SpigetProvider;
use crate::store::PluginEntry;

/// Builds a boxed source integration for one tracked entry.
pub type ProviderConstructor = fn(PluginEntry, SourceContext) -> Result<Box<dyn SourceProvider>>;

const PROVIDERS: &[(&str, ProviderConstructor)] = &[
    ("spiget", construct_spiget),
    ("github", construct_github),
    ("jenkins", construct_jenkins),
    ("modrinth", construct_modrinth),
];

fn construct_spiget(entry: PluginEntry, context: SourceContext) -> Result<Box<dyn SourceProvider>> {
    Ok(Box::new(SpigetProvider::new(entry, context)?))
}

fn construct_github(entry: PluginEntry, context: SourceContext) -> Result<Box<dyn SourceProvider>> {
    Ok(Box::new(GithubProvider::new(entry, context)?))
}

fn construct_jenkins(
    entry: PluginEntry,
    context: SourceContext,
) -> Result<Box<dyn SourceProvider>> {
    Ok(Box::new(JenkinsProvider::new(entry, context)?))
}

fn construct_modrinth(
    entry: PluginEntry,
    context: SourceContext,
) -> Result<Box<dyn SourceProvider>> {
    Ok(Box::new(ModrinthProvider::new(entry, context)))
}

/// Case-insensitive lookup of a provider constructor by tag.
pub fn resolve(tag: &str) -> Result<ProviderConstructor> {
    let wanted = tag.to_ascii_lowercase();
    PROVIDERS
        .iter()
        .find(|(known, _)| *known == wanted)
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| SynplugError::UnknownProviderType {
            tag: tag.to_string(),
        })
}

/// Registered tags in registration order, for operator help.
pub fn known_tags() -> impl Iterator<Item = &'static str> {
    PROVIDERS.iter().map(|(tag, _)| *tag)
}

/// Resolve, construct, and wrap the provider for one entry.
pub fn provider_for(
    entry: &PluginEntry,
    context: &SourceContext,
    plugins_dir: &Path,
) -> Result<Provider> {
    let constructor = resolve(&entry.type_tag)?;
    let source = constructor(entry.clone(), context.clone())?;
    let default_file = entry.default_file_path(plugins_dir);
    Ok(Provider::new(source, context.client.clone(), default_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynplugConfig;
    use crate::store::ResourceRef;
    use std::path::PathBuf;

    fn context() -> SourceContext {
        SourceContext::new(&SynplugConfig::default()).expect("context")
    }

    #[test]
    fn resolution_is_case_insensitive() {
        assert!(resolve("spiget").is_ok());
        assert!(resolve("SPIGET").is_ok());
        assert!(resolve("Modrinth").is_ok());
        assert!(resolve("JeNkInS").is_ok());
    }

    #[test]
    fn unknown_tag_error_message_is_exact() {
        let err = resolve("bukkitdev").unwrap_err();
        assert_eq!(err.to_string(), "Unable to find plugin of type bukkitdev");
    }

    #[test]
    fn registration_order_is_stable() {
        let tags: Vec<&str> = known_tags().collect();
        assert_eq!(tags, ["spiget", "github", "jenkins", "modrinth"]);
    }

    #[test]
    fn provider_for_wires_entry_and_default_path() {
        let entry = PluginEntry::new(
            "spiget",
            "EssentialsX",
            Some(ResourceRef::Number(9089)),
            None,
        )
        .expect("entry");

        let provider =
            provider_for(&entry, &context(), Path::new("/srv/paper/plugins")).expect("provider");
        assert_eq!(provider.entry().type_tag, "spiget");
        assert_eq!(
            provider.default_file(),
            PathBuf::from("/srv/paper/plugins/EssentialsX.jar").as_path()
        );
    }

    #[test]
    fn constructor_validation_surfaces_through_provider_for() {
        let entry = PluginEntry::new("spiget", "EssentialsX", None, None).expect("entry");
        let err = provider_for(&entry, &context(), Path::new("./plugins"))
            .err()
            .expect("a resource-less spiget entry must not construct");
        assert!(matches!(err, SynplugError::Config(_)));
    }
}
