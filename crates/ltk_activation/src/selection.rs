//! Selection model: what the user asked to activate.
//!
//! An [`ActivationRequest`] keeps skins and custom mods in two separate,
//! ordered lists. Iterating it with [`ActivationRequest::items`] always yields
//! skins first and custom mods second, so the position of an item in that
//! sequence (its *item index*) is stable from request construction until the
//! final progress event.
//!
//! [`Selection`] is the editable form a UI keeps while the user picks skins,
//! chromas and forms. It enforces the one-skin-per-champion and
//! one-variant-per-skin rules and turns into a request on demand.

use crate::helper::SkinDownloadRequest;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One skin picked for a champion, optionally narrowed to a chroma or a form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinChoice {
    pub champion_id: u32,
    pub champion_name: String,
    pub skin_id: u32,
    pub skin_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<String>,
    #[serde(default)]
    pub display_asset_url: String,
    #[serde(default)]
    pub icon_url: String,
}

impl SkinChoice {
    /// Create a base skin choice with no chroma or form.
    pub fn new(
        champion_id: u32,
        champion_name: impl Into<String>,
        skin_id: u32,
        skin_name: impl Into<String>,
    ) -> Self {
        Self {
            champion_id,
            champion_name: champion_name.into(),
            skin_id,
            skin_name: skin_name.into(),
            chroma_id: None,
            chroma_name: None,
            chroma_color: None,
            form_id: None,
            form_name: None,
            display_asset_url: String::new(),
            icon_url: String::new(),
        }
    }

    /// Narrow this choice to a chroma. Clears any form.
    pub fn with_chroma(
        mut self,
        chroma_id: u32,
        name: Option<String>,
        color: Option<String>,
    ) -> Self {
        self.chroma_id = Some(chroma_id);
        self.chroma_name = name;
        self.chroma_color = color;
        self.form_id = None;
        self.form_name = None;
        self
    }

    /// Narrow this choice to a form. Clears any chroma.
    pub fn with_form(mut self, form_id: u32, name: Option<String>) -> Self {
        self.form_id = Some(form_id);
        self.form_name = name;
        self.chroma_id = None;
        self.chroma_name = None;
        self.chroma_color = None;
        self
    }

    /// Key identifying this exact variant, see [`SkinDownloadRequest::composite_key`].
    pub fn composite_key(&self) -> String {
        self.download_request().composite_key()
    }

    /// Name passed to the helper for this variant.
    pub fn display_name(&self) -> String {
        if let Some(form) = &self.form_name {
            format!("{} {} ({})", self.champion_name, self.skin_name, form)
        } else if let Some(chroma) = &self.chroma_name {
            format!("{} {} ({})", self.champion_name, self.skin_name, chroma)
        } else {
            format!("{} {}", self.champion_name, self.skin_name)
        }
    }

    pub fn download_request(&self) -> SkinDownloadRequest {
        SkinDownloadRequest {
            champion_id: self.champion_id,
            skin_id: self.skin_id,
            chroma_id: if self.form_id.is_some() {
                None
            } else {
                self.chroma_id
            },
            form_id: self.form_id,
        }
    }
}

/// A locally imported mod archive or directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomModChoice {
    /// Globally unique id, stable across sessions.
    pub id: String,
    pub display_name: String,
    pub local_path: Utf8PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CustomModChoice {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        local_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            local_path: local_path.into(),
            thumbnail: None,
        }
    }
}

/// One entry of an activation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionItem {
    Skin(SkinChoice),
    Custom(CustomModChoice),
}

impl SelectionItem {
    pub fn name(&self) -> String {
        match self {
            SelectionItem::Skin(skin) => skin.display_name(),
            SelectionItem::Custom(custom) => custom.display_name.clone(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, SelectionItem::Custom(_))
    }
}

/// Borrowed view of a [`SelectionItem`], yielded by [`ActivationRequest::items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRef<'a> {
    Skin(&'a SkinChoice),
    Custom(&'a CustomModChoice),
}

impl SelectionRef<'_> {
    pub fn to_owned_item(self) -> SelectionItem {
        match self {
            SelectionRef::Skin(skin) => SelectionItem::Skin(skin.clone()),
            SelectionRef::Custom(custom) => SelectionItem::Custom(custom.clone()),
        }
    }
}

/// Everything one activation call should apply, skins first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRequest {
    #[serde(default)]
    skins: Vec<SkinChoice>,
    #[serde(default)]
    customs: Vec<CustomModChoice>,
}

impl ActivationRequest {
    pub fn new(skins: Vec<SkinChoice>, customs: Vec<CustomModChoice>) -> Self {
        Self { skins, customs }
    }

    /// Build a request from a mixed list, keeping the relative order within
    /// each kind.
    pub fn from_items(items: impl IntoIterator<Item = SelectionItem>) -> Self {
        let mut request = Self::default();
        for item in items {
            match item {
                SelectionItem::Skin(skin) => request.skins.push(skin),
                SelectionItem::Custom(custom) => request.customs.push(custom),
            }
        }
        request
    }

    pub fn skins(&self) -> &[SkinChoice] {
        &self.skins
    }

    pub fn customs(&self) -> &[CustomModChoice] {
        &self.customs
    }

    pub fn len(&self) -> usize {
        self.skins.len() + self.customs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skins.is_empty() && self.customs.is_empty()
    }

    /// All items in canonical order: every skin, then every custom mod.
    pub fn items(&self) -> impl Iterator<Item = SelectionRef<'_>> + '_ {
        self.skins
            .iter()
            .map(SelectionRef::Skin)
            .chain(self.customs.iter().map(SelectionRef::Custom))
    }
}

/// Editable selection state: at most one skin per champion plus a set of
/// custom mods.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    skins: BTreeMap<u32, SkinChoice>,
    customs: Vec<CustomModChoice>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a skin for its champion, replacing any previous skin and
    /// dropping chroma and form.
    pub fn select_skin(&mut self, mut skin: SkinChoice) {
        let keep_variant = self
            .skins
            .get(&skin.champion_id)
            .is_some_and(|current| current.skin_id == skin.skin_id);
        if !keep_variant {
            skin.chroma_id = None;
            skin.chroma_name = None;
            skin.chroma_color = None;
            skin.form_id = None;
            skin.form_name = None;
        }
        self.skins.insert(skin.champion_id, skin);
    }

    /// Select a chroma of the champion's current skin.
    ///
    /// Returns `false` when `skin_id` is not the selected skin of that champion.
    pub fn select_chroma(
        &mut self,
        champion_id: u32,
        skin_id: u32,
        chroma_id: u32,
        name: Option<String>,
        color: Option<String>,
    ) -> bool {
        match self.skins.get_mut(&champion_id) {
            Some(current) if current.skin_id == skin_id => {
                *current = current.clone().with_chroma(chroma_id, name, color);
                true
            }
            _ => false,
        }
    }

    /// Select a form of the champion's current skin.
    ///
    /// Returns `false` when `skin_id` is not the selected skin of that champion.
    pub fn select_form(
        &mut self,
        champion_id: u32,
        skin_id: u32,
        form_id: u32,
        name: Option<String>,
    ) -> bool {
        match self.skins.get_mut(&champion_id) {
            Some(current) if current.skin_id == skin_id => {
                *current = current.clone().with_form(form_id, name);
                true
            }
            _ => false,
        }
    }

    pub fn deselect(&mut self, champion_id: u32) -> Option<SkinChoice> {
        self.skins.remove(&champion_id)
    }

    /// Add the custom mod, or remove it if a mod with the same id is present.
    /// Returns whether the mod is selected afterwards.
    pub fn toggle_custom(&mut self, custom: CustomModChoice) -> bool {
        if let Some(pos) = self.customs.iter().position(|c| c.id == custom.id) {
            self.customs.remove(pos);
            false
        } else {
            self.customs.push(custom);
            true
        }
    }

    pub fn skin_for(&self, champion_id: u32) -> Option<&SkinChoice> {
        self.skins.get(&champion_id)
    }

    pub fn is_empty(&self) -> bool {
        self.skins.is_empty() && self.customs.is_empty()
    }

    pub fn clear(&mut self) {
        self.skins.clear();
        self.customs.clear();
    }

    /// Skins ordered by champion id, then custom mods in the order they were added.
    pub fn to_request(&self) -> ActivationRequest {
        ActivationRequest::new(self.skins.values().cloned().collect(), self.customs.clone())
    }
}
