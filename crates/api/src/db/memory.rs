//! In-memory store for tests.
//!
//! Mirrors the `PostgreSQL` store's observable behavior: owner scoping,
//! unique (owner, name) labels, unique emails, ordering and cascade rules.
//! Each operation holds one lock for its whole duration, which stands in for
//! a transaction.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use recipe_catalog_core::{Email, Patch, Price, RecipeId, UserId};

use super::{CatalogStore, IdentityStore, RepositoryError, Store};
use crate::models::{
    Label, LabelKind, NewToken, NewUser, Recipe, RecipeChanges, RecipeDraft, RecipeFilter, User,
    UserChanges,
};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredToken {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

struct StoredRecipe {
    owner: UserId,
    title: String,
    time_minutes: i32,
    price: Price,
    description: Option<String>,
    link: Option<String>,
    image: Option<String>,
    tags: BTreeSet<i32>,
    ingredients: BTreeSet<i32>,
}

struct StoredLabel {
    owner: UserId,
    name: String,
}

#[derive(Default)]
struct State {
    next_id: i32,
    users: BTreeMap<i32, StoredUser>,
    tokens: HashMap<String, StoredToken>,
    recipes: BTreeMap<i32, StoredRecipe>,
    tags: BTreeMap<i32, StoredLabel>,
    ingredients: BTreeMap<i32, StoredLabel>,
}

impl State {
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    const fn labels(&self, kind: LabelKind) -> &BTreeMap<i32, StoredLabel> {
        match kind {
            LabelKind::Tag => &self.tags,
            LabelKind::Ingredient => &self.ingredients,
        }
    }

    const fn labels_mut(&mut self, kind: LabelKind) -> &mut BTreeMap<i32, StoredLabel> {
        match kind {
            LabelKind::Tag => &mut self.tags,
            LabelKind::Ingredient => &mut self.ingredients,
        }
    }

    fn label_named(&self, owner: UserId, kind: LabelKind, name: &str) -> Option<i32> {
        self.labels(kind)
            .iter()
            .find(|(_, l)| l.owner == owner && l.name == name)
            .map(|(&id, _)| id)
    }

    fn get_or_create(&mut self, owner: UserId, kind: LabelKind, name: &str) -> i32 {
        if let Some(id) = self.label_named(owner, kind, name) {
            return id;
        }
        let id = self.next_id();
        self.labels_mut(kind).insert(
            id,
            StoredLabel {
                owner,
                name: name.to_owned(),
            },
        );
        id
    }

    fn resolve(&mut self, owner: UserId, kind: LabelKind, names: &[String]) -> BTreeSet<i32> {
        names
            .iter()
            .map(|name| self.get_or_create(owner, kind, name))
            .collect()
    }

    fn resolve_labels(&self, kind: LabelKind, ids: &BTreeSet<i32>) -> Vec<Label> {
        ids.iter()
            .filter_map(|id| {
                self.labels(kind).get(id).map(|l| Label {
                    id: *id,
                    name: l.name.clone(),
                })
            })
            .collect()
    }

    fn recipe(&self, id: i32, stored: &StoredRecipe) -> Recipe {
        Recipe {
            id: RecipeId::new(id),
            user_id: stored.owner,
            title: stored.title.clone(),
            time_minutes: stored.time_minutes,
            price: stored.price,
            description: stored.description.clone(),
            link: stored.link.clone(),
            image: stored.image.clone(),
            tags: self
                .resolve_labels(LabelKind::Tag, &stored.tags)
                .into_iter()
                .map(Into::into)
                .collect(),
            ingredients: self
                .resolve_labels(LabelKind::Ingredient, &stored.ingredients)
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    fn owned_recipe(&self, owner: UserId, id: RecipeId) -> Option<Recipe> {
        self.recipes
            .get(&id.as_i32())
            .filter(|r| r.owner == owner)
            .map(|r| self.recipe(id.as_i32(), r))
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| &u.user.email == email && Some(u.user.id) != except)
    }
}

/// Store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a recipe's stored image path, which the API treats as read-only.
    pub async fn set_recipe_image(&self, id: RecipeId, image: Option<String>) {
        let mut state = self.state.lock().await;
        if let Some(recipe) = state.recipes.get_mut(&id.as_i32()) {
            recipe.image = image;
        }
    }

    /// Deactivate a user, as an administrator would.
    pub async fn deactivate_user(&self, id: UserId) {
        let mut state = self.state.lock().await;
        if let Some(stored) = state.users.get_mut(&id.as_i32()) {
            stored.user.is_active = false;
        }
    }

    /// Total number of labels of one kind across all owners.
    pub async fn label_count(&self, kind: LabelKind) -> usize {
        self.state.lock().await.labels(kind).len()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::new(state.next_id()),
            email: user.email.clone(),
            name: user.name.clone(),
            is_active: true,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            created.id.as_i32(),
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if let Patch::Set(email) = &changes.email
            && state.email_taken(email, Some(id))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let stored = state
            .users
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        if let Patch::Set(email) = &changes.email {
            stored.user.email = email.clone();
        }
        if let Patch::Set(name) = &changes.name {
            stored.user.name.clone_from(name);
        }
        if let Patch::Set(hash) = &changes.password_hash {
            stored.password_hash.clone_from(hash);
        }
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }

    async fn store_token(&self, token: &NewToken) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.tokens.contains_key(&token.token_hash) {
            return Err(RepositoryError::Conflict("token already exists".to_owned()));
        }
        let now = Utc::now();
        state
            .tokens
            .retain(|_, t| t.user_id != token.user_id || t.expires_at > now);
        state.tokens.insert(
            token.token_hash.clone(),
            StoredToken {
                user_id: token.user_id,
                expires_at: token.expires_at,
            },
        );
        Ok(())
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|_, t| t.expires_at > now);
        Ok((before - state.tokens.len()) as u64)
    }

    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .get(token_hash)
            .filter(|t| t.expires_at > now)
            .and_then(|t| state.users.get(&t.user_id.as_i32()))
            .map(|u| u.user.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .recipes
            .iter()
            .rev()
            .filter(|(_, r)| r.owner == owner)
            .map(|(&id, r)| state.recipe(id, r))
            .filter(|r| filter.matches(r))
            .collect())
    }

    async fn get_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.owned_recipe(owner, id))
    }

    async fn create_recipe(
        &self,
        owner: UserId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, RepositoryError> {
        let mut state = self.state.lock().await;
        let tags = match &draft.tags {
            Patch::Set(names) => state.resolve(owner, LabelKind::Tag, names),
            Patch::Unset => BTreeSet::new(),
        };
        let ingredients = match &draft.ingredients {
            Patch::Set(names) => state.resolve(owner, LabelKind::Ingredient, names),
            Patch::Unset => BTreeSet::new(),
        };

        let id = state.next_id();
        state.recipes.insert(
            id,
            StoredRecipe {
                owner,
                title: draft.title.clone(),
                time_minutes: draft.time_minutes,
                price: draft.price,
                description: draft.description.clone(),
                link: draft.link.clone(),
                image: None,
                tags,
                ingredients,
            },
        );

        state
            .owned_recipe(owner, RecipeId::new(id))
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
        changes: &RecipeChanges,
    ) -> Result<Recipe, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.owned_recipe(owner, id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let tags = match &changes.tags {
            Patch::Set(names) => Some(state.resolve(owner, LabelKind::Tag, names)),
            Patch::Unset => None,
        };
        let ingredients = match &changes.ingredients {
            Patch::Set(names) => Some(state.resolve(owner, LabelKind::Ingredient, names)),
            Patch::Unset => None,
        };

        let stored = state
            .recipes
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        if let Patch::Set(title) = &changes.title {
            stored.title.clone_from(title);
        }
        if let Patch::Set(minutes) = changes.time_minutes {
            stored.time_minutes = minutes;
        }
        if let Patch::Set(price) = changes.price {
            stored.price = price;
        }
        if let Patch::Set(description) = &changes.description {
            stored.description.clone_from(description);
        }
        if let Patch::Set(link) = &changes.link {
            stored.link.clone_from(link);
        }
        if let Some(tags) = tags {
            stored.tags = tags;
        }
        if let Some(ingredients) = ingredients {
            stored.ingredients = ingredients;
        }

        state
            .owned_recipe(owner, id)
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_recipe(&self, owner: UserId, id: RecipeId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.owned_recipe(owner, id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        state.recipes.remove(&id.as_i32());
        Ok(())
    }

    async fn list_labels(
        &self,
        owner: UserId,
        kind: LabelKind,
        assigned_only: bool,
    ) -> Result<Vec<Label>, RepositoryError> {
        let state = self.state.lock().await;
        let assigned: BTreeSet<i32> = state
            .recipes
            .values()
            .filter(|r| r.owner == owner)
            .flat_map(|r| match kind {
                LabelKind::Tag => r.tags.iter().copied(),
                LabelKind::Ingredient => r.ingredients.iter().copied(),
            })
            .collect();

        let mut labels: Vec<Label> = state
            .labels(kind)
            .iter()
            .filter(|&(id, l)| l.owner == owner && (!assigned_only || assigned.contains(id)))
            .map(|(&id, l)| Label {
                id,
                name: l.name.clone(),
            })
            .collect();
        labels.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(labels)
    }

    async fn get_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<Option<Label>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .labels(kind)
            .get(&id)
            .filter(|l| l.owner == owner)
            .map(|l| Label {
                id,
                name: l.name.clone(),
            }))
    }

    async fn create_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        name: &str,
    ) -> Result<Label, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.label_named(owner, kind, name).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "{} already exists",
                kind.noun()
            )));
        }
        let id = state.get_or_create(owner, kind, name);
        Ok(Label {
            id,
            name: name.to_owned(),
        })
    }

    async fn rename_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
        name: &str,
    ) -> Result<Label, RepositoryError> {
        let mut state = self.state.lock().await;
        if state
            .labels(kind)
            .get(&id)
            .is_none_or(|l| l.owner != owner)
        {
            return Err(RepositoryError::NotFound);
        }
        if state
            .label_named(owner, kind, name)
            .is_some_and(|existing| existing != id)
        {
            return Err(RepositoryError::Conflict(format!(
                "{} already exists",
                kind.noun()
            )));
        }

        let label = state
            .labels_mut(kind)
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        label.name = name.to_owned();
        Ok(Label {
            id,
            name: name.to_owned(),
        })
    }

    async fn delete_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state
            .labels(kind)
            .get(&id)
            .is_none_or(|l| l.owner != owner)
        {
            return Err(RepositoryError::NotFound);
        }

        state.labels_mut(kind).remove(&id);
        for recipe in state.recipes.values_mut() {
            match kind {
                LabelKind::Tag => recipe.tags.remove(&id),
                LabelKind::Ingredient => recipe.ingredients.remove(&id),
            };
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
