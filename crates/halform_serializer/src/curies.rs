//! Curie consolidation.
//!
//! Every resource in an assembled tree may carry its own `_links.curies`.
//! [`consolidate`] gathers them into a single list on the root:
//!
//! 1. Each node's curies are popped and registered, along with every
//!    `_links` and `_embedded` key at that node that uses one of them. A key
//!    whose prefix the node does not declare is attributed to the nearest
//!    enclosing resource that does.
//! 2. Children are merged upwards. A curie already known by name and href
//!    absorbs the child's references; a new href under a known name is kept
//!    as a separate entry.
//! 3. At the root, curies sharing a name but not an href are renamed to
//!    `<name>0`, `<name>1`, ... (skipping names in use), last discovered
//!    first, and every recorded reference is rewritten to the new name.
//! 4. The surviving list is written to the root's `_links.curies`.
//!
//! References are recorded as paths from the root rather than pointers, so
//! rewriting can walk the tree mutably once collection is finished.

use halform_core::CurieEntry;
use serde_json::{Map, Value};

const LINKS: &str = "_links";
const EMBEDDED: &str = "_embedded";
const CURIES: &str = "curies";

/// One hop from a node to an embedded child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Key under `_embedded`.
    pub key: String,
    /// Position in the array, when the key holds several resources.
    pub index: Option<usize>,
}

/// Which map of a node a reference lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The node's `_links`.
    Links,
    /// The node's `_embedded`.
    Embedded,
}

/// A key that uses a curie prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Path from the root to the node holding the key.
    pub path: Vec<Step>,
    /// Map holding the key.
    pub section: Section,
    /// The curie-qualified key, such as `doc:author`.
    pub rel: String,
}

/// A curie together with every key that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurieWithReferences {
    name: String,
    href: String,
    templated: bool,
    references: Vec<Reference>,
}

impl CurieWithReferences {
    fn new(entry: CurieEntry) -> Self {
        Self {
            name: entry.name,
            href: entry.href,
            templated: entry.templated,
            references: Vec::new(),
        }
    }

    /// Returns the current name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the href template.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Returns the recorded references.
    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    fn add_reference(&mut self, reference: Reference) {
        if !self.references.contains(&reference) {
            self.references.push(reference);
        }
    }

    fn absorb(&mut self, other: Self) {
        for reference in other.references {
            self.add_reference(reference);
        }
    }

    fn entry(&self) -> CurieEntry {
        CurieEntry {
            name: self.name.clone(),
            href: self.href.clone(),
            templated: self.templated,
        }
    }
}

/// A rename decided by collision resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    /// The name before resolution.
    pub from: String,
    /// The generated name.
    pub to: String,
    /// The curie href, which tells the colliding entries apart.
    pub href: String,
}

/// The curies of a tree, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurieCollection {
    curies: Vec<CurieWithReferences>,
    // Keys whose prefix no curie at or below their node declares; resolved
    // against the enclosing resource when merged upwards.
    pending: Vec<Reference>,
}

impl CurieCollection {
    /// Pops every `_links.curies` list in `tree` and records the keys using them.
    ///
    /// Non-root `_links` maps left empty are removed.
    pub fn extract_from(tree: &mut Map<String, Value>) -> Self {
        let mut path = Vec::new();
        extract(tree, &mut path)
    }

    /// Returns the curies.
    pub fn iter(&self) -> impl Iterator<Item = &CurieWithReferences> {
        self.curies.iter()
    }

    /// Returns the number of curies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.curies.len()
    }

    /// Returns `true` if no curie was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curies.is_empty()
    }

    /// Returns the curies as `{name, href, templated}` entries.
    #[must_use]
    pub fn entries(&self) -> Vec<CurieEntry> {
        self.curies.iter().map(CurieWithReferences::entry).collect()
    }

    /// Renames curies whose name is shared with a different href.
    ///
    /// Walks from the last discovered curie to the first, so the first one
    /// seen keeps its name. References are not touched; see
    /// [`rewrite`](Self::rewrite).
    pub fn resolve_collisions(&mut self) -> Vec<Rename> {
        let mut renames = Vec::new();
        for i in (0..self.curies.len()).rev() {
            let current = &self.curies[i];
            let collides = self
                .curies
                .iter()
                .any(|other| other.name == current.name && other.href != current.href);
            if !collides {
                continue;
            }
            let to = self.generate_name(&current.name);
            let curie = &mut self.curies[i];
            tracing::debug!(from = %curie.name, to = %to, href = %curie.href, "renaming colliding curie");
            renames.push(Rename {
                from: core::mem::replace(&mut curie.name, to.clone()),
                to,
                href: curie.href.clone(),
            });
        }
        renames
    }

    /// Rewrites every reference to a curie whose name no longer matches its
    /// references' prefix.
    pub fn rewrite(&self, tree: &mut Map<String, Value>) {
        let mut edits: Vec<(&Reference, String)> = self
            .curies
            .iter()
            .flat_map(|curie| {
                curie.references.iter().filter_map(|reference| {
                    let (prefix, rest) = reference.rel.split_once(':')?;
                    (prefix != curie.name).then(|| (reference, format!("{}:{rest}", curie.name)))
                })
            })
            .collect();

        // Deeper nodes first: renaming an `_embedded` key changes the path to
        // everything below it.
        edits.sort_by(|(a, _), (b, _)| b.path.len().cmp(&a.path.len()));

        for (reference, renamed) in edits {
            let section = match reference.section {
                Section::Links => LINKS,
                Section::Embedded => EMBEDDED,
            };
            if let Some(Value::Object(map)) =
                node_at(tree, &reference.path).and_then(|node| node.get_mut(section))
            {
                rename_key(map, &reference.rel, &renamed);
            }
        }
    }

    /// Writes the curies to the root's `_links.curies`.
    ///
    /// With no curies, no `curies` key is written and an empty root
    /// `_links` is removed.
    pub fn hoist(&self, tree: &mut Map<String, Value>) {
        if self.curies.is_empty() {
            if tree
                .get(LINKS)
                .and_then(Value::as_object)
                .is_some_and(Map::is_empty)
            {
                tree.shift_remove(LINKS);
            }
            return;
        }

        let entries: Vec<Value> = self
            .curies
            .iter()
            .map(|curie| {
                let mut entry = Map::new();
                entry.insert("name".to_owned(), Value::String(curie.name.clone()));
                entry.insert("href".to_owned(), Value::String(curie.href.clone()));
                entry.insert("templated".to_owned(), Value::Bool(curie.templated));
                Value::Object(entry)
            })
            .collect();

        let links = tree
            .entry(LINKS)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(links) = links {
            match links.get_mut(CURIES) {
                Some(Value::Array(kept)) => kept.extend(entries),
                Some(other) => {
                    tracing::warn!(curies = %other, "replacing non-array curies at the root");
                    *other = Value::Array(entries);
                }
                None => {
                    links.insert(CURIES.to_owned(), Value::Array(entries));
                }
            }
        }
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut CurieWithReferences> {
        self.curies.iter_mut().find(|curie| curie.name == name)
    }

    fn declare(&mut self, entry: CurieEntry) {
        if !self.curies.iter().any(|curie| curie.name == entry.name) {
            self.curies.push(CurieWithReferences::new(entry));
        }
    }

    fn reference(&mut self, rel: &str, path: &[Step], section: Section) {
        if rel.contains(':') {
            self.attach(Reference {
                path: path.to_vec(),
                section,
                rel: rel.to_owned(),
            });
        }
    }

    fn attach(&mut self, reference: Reference) {
        let prefix = reference.rel.split_once(':').map_or("", |(prefix, _)| prefix);
        match self.find_mut(prefix) {
            Some(curie) => curie.add_reference(reference),
            None => self.pending.push(reference),
        }
    }

    fn merge(&mut self, other: Self) {
        for curie in other.curies {
            match self
                .curies
                .iter_mut()
                .find(|known| known.name == curie.name && known.href == curie.href)
            {
                Some(known) => known.absorb(curie),
                None => self.curies.push(curie),
            }
        }
        for reference in other.pending {
            self.attach(reference);
        }
    }

    fn generate_name(&self, base: &str) -> String {
        (0_u32..)
            .map(|n| format!("{base}{n}"))
            .find(|name| !self.curies.iter().any(|curie| &curie.name == name))
            .unwrap_or_else(|| format!("{base}_"))
    }
}

/// Consolidates every curie of `tree` into the root's `_links.curies`.
///
/// Returns the renames made to resolve collisions.
pub fn consolidate(tree: &mut Map<String, Value>) -> Vec<Rename> {
    let mut curies = CurieCollection::extract_from(tree);
    let renames = curies.resolve_collisions();
    curies.rewrite(tree);
    curies.hoist(tree);
    renames
}

fn extract(node: &mut Map<String, Value>, path: &mut Vec<Step>) -> CurieCollection {
    let mut local = CurieCollection::default();

    if let Some(Value::Object(links)) = node.get_mut(LINKS) {
        match links.shift_remove(CURIES) {
            Some(Value::Array(declared)) => {
                let mut malformed = Vec::new();
                for entry in declared {
                    match serde_json::from_value::<CurieEntry>(entry.clone()) {
                        Ok(entry) => local.declare(entry),
                        Err(err) => {
                            tracing::warn!(%err, %entry, "keeping malformed curie in place");
                            malformed.push(entry);
                        }
                    }
                }
                if !malformed.is_empty() {
                    links.insert(CURIES.to_owned(), Value::Array(malformed));
                }
            }
            Some(other) => {
                tracing::warn!(curies = %other, "keeping non-array curies in place");
                links.insert(CURIES.to_owned(), other);
            }
            None => {}
        }
        for rel in links.keys() {
            local.reference(rel, path, Section::Links);
        }
    }

    if let Some(Value::Object(embedded)) = node.get_mut(EMBEDDED) {
        for (key, value) in embedded.iter_mut() {
            local.reference(key, path, Section::Embedded);
            match value {
                Value::Array(items) => {
                    for (index, item) in items.iter_mut().enumerate() {
                        if let Value::Object(child) = item {
                            local.merge(extract_child(child, path, key, Some(index)));
                        }
                    }
                }
                Value::Object(child) => local.merge(extract_child(child, path, key, None)),
                _ => {}
            }
        }
    }

    local
}

fn extract_child(
    child: &mut Map<String, Value>,
    path: &mut Vec<Step>,
    key: &str,
    index: Option<usize>,
) -> CurieCollection {
    path.push(Step {
        key: key.to_owned(),
        index,
    });
    let found = extract(child, path);
    path.pop();

    if child
        .get(LINKS)
        .and_then(Value::as_object)
        .is_some_and(Map::is_empty)
    {
        child.shift_remove(LINKS);
    }
    found
}

fn node_at<'t>(root: &'t mut Map<String, Value>, path: &[Step]) -> Option<&'t mut Map<String, Value>> {
    let mut node = root;
    for step in path {
        let child = node.get_mut(EMBEDDED)?.get_mut(step.key.as_str())?;
        let child = match step.index {
            Some(index) => child.get_mut(index)?,
            None => child,
        };
        node = child.as_object_mut()?;
    }
    Some(node)
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if !map.contains_key(from) || map.contains_key(to) {
        return;
    }
    *map = core::mem::take(map)
        .into_iter()
        .map(|(key, value)| if key == from { (to.to_owned(), value) } else { (key, value) })
        .collect();
}
