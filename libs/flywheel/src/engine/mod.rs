//! DynamoDB engine: table registry, schema management and item operations.
//!
//! Items are plain attribute maps. The engine only knows each table's key
//! layout, which is enough to create tables and route saves.

mod table;

pub use table::{KeyAttribute, KeyKind, TableSpec};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use aws_sdk_dynamodb::types::{AttributeValue, BillingMode};
use tracing::{debug, info, instrument};

use crate::common::{FlywheelError, FlywheelResult};
use crate::config::{ConflictMode, Namespace};
use crate::connection::{ConnectOptions, DynamoConnection};

/// A DynamoDB item
pub type Item = HashMap<String, AttributeValue>;

/// Engine vended by [`crate::Flywheel`].
///
/// Created disconnected; [`Engine::connect`] attaches the DynamoDB
/// connection every item and schema operation needs.
#[derive(Debug)]
pub struct Engine {
    namespace: Namespace,
    default_conflict: ConflictMode,
    dynamo: Option<DynamoConnection>,
    tables: RwLock<BTreeMap<String, TableSpec>>,
}

impl Engine {
    pub fn new(namespace: Namespace, default_conflict: ConflictMode) -> Self {
        Self {
            namespace,
            default_conflict,
            dynamo: None,
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Connect to `region` with explicit credentials and endpoint
    pub async fn connect(&mut self, region: &str, options: ConnectOptions) -> FlywheelResult<()> {
        self.dynamo = Some(DynamoConnection::connect(region, options).await?);
        Ok(())
    }

    pub fn dynamo(&self) -> FlywheelResult<&DynamoConnection> {
        self.dynamo.as_ref().ok_or(FlywheelError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.dynamo.is_some()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn default_conflict(&self) -> ConflictMode {
        self.default_conflict
    }

    /// DynamoDB table name for a logical table name
    pub fn table_name(&self, name: &str) -> String {
        self.namespace.qualify(name)
    }

    /// Register a table. A spec with the same name replaces the old one.
    pub fn register(&self, spec: TableSpec) {
        debug!(table = %spec.name, "Registering table");
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec.name.clone(), spec);
    }

    /// Logical names of every registered table
    pub fn registered_tables(&self) -> Vec<String> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn spec(&self, table: &str) -> FlywheelResult<TableSpec> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .ok_or_else(|| FlywheelError::UnknownTable(table.to_string()))
    }

    fn specs(&self) -> Vec<TableSpec> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    async fn existing_tables(&self) -> FlywheelResult<HashSet<String>> {
        let client = self.dynamo()?.client();
        let mut names = HashSet::new();
        let mut start: Option<String> = None;

        loop {
            let output = client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;

            names.extend(output.table_names().iter().cloned());

            match output.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }

        Ok(names)
    }

    /// Create every registered table that does not exist yet.
    ///
    /// Returns the DynamoDB names of the tables that were created.
    #[instrument(skip(self))]
    pub async fn create_schema(&self) -> FlywheelResult<Vec<String>> {
        let client = self.dynamo()?.client();
        let existing = self.existing_tables().await?;
        let mut created = Vec::new();

        for spec in self.specs() {
            let table_name = self.table_name(&spec.name);
            if existing.contains(&table_name) {
                debug!(table = %table_name, "Table already exists");
                continue;
            }

            client
                .create_table()
                .table_name(&table_name)
                .set_key_schema(Some(spec.key_schema()?))
                .set_attribute_definitions(Some(spec.attribute_definitions()?))
                .billing_mode(BillingMode::PayPerRequest)
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;

            info!(table = %table_name, "Created table");
            created.push(table_name);
        }

        Ok(created)
    }

    /// Delete every registered table that exists.
    ///
    /// Returns the DynamoDB names of the tables that were deleted.
    #[instrument(skip(self))]
    pub async fn delete_schema(&self) -> FlywheelResult<Vec<String>> {
        let client = self.dynamo()?.client();
        let existing = self.existing_tables().await?;
        let mut deleted = Vec::new();

        for spec in self.specs() {
            let table_name = self.table_name(&spec.name);
            if !existing.contains(&table_name) {
                continue;
            }

            client
                .delete_table()
                .table_name(&table_name)
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;

            info!(table = %table_name, "Deleted table");
            deleted.push(table_name);
        }

        Ok(deleted)
    }

    /// Save with the engine's default conflict mode
    pub async fn save(&self, table: &str, item: Item) -> FlywheelResult<()> {
        self.save_with(table, item, self.default_conflict).await
    }

    #[instrument(skip(self, item, mode), fields(mode = %mode))]
    pub async fn save_with(&self, table: &str, item: Item, mode: ConflictMode) -> FlywheelResult<()> {
        let spec = self.spec(table)?;
        let key = spec.key_of(&item)?;
        let table_name = self.table_name(table);
        let client = self.dynamo()?.client();

        match mode {
            ConflictMode::Overwrite => {
                client
                    .put_item()
                    .table_name(&table_name)
                    .set_item(Some(item))
                    .send()
                    .await
                    .map_err(aws_sdk_dynamodb::Error::from)?;
            }
            ConflictMode::Raise => {
                let result = client
                    .put_item()
                    .table_name(&table_name)
                    .set_item(Some(item))
                    .condition_expression("attribute_not_exists(#hk)")
                    .expression_attribute_names("#hk", &spec.hash_key.name)
                    .send()
                    .await;

                if let Err(err) = result {
                    let err = err.into_service_error();
                    if err.is_conditional_check_failed_exception() {
                        return Err(FlywheelError::ItemExists(table_name));
                    }
                    return Err(aws_sdk_dynamodb::Error::from(err).into());
                }
            }
            ConflictMode::Update => {
                let values = spec.value_attributes(&item);
                if values.is_empty() {
                    // Nothing to SET; store the bare key
                    client
                        .put_item()
                        .table_name(&table_name)
                        .set_item(Some(key))
                        .send()
                        .await
                        .map_err(aws_sdk_dynamodb::Error::from)?;
                } else {
                    let mut assignments = Vec::with_capacity(values.len());
                    let mut names = HashMap::with_capacity(values.len());
                    let mut placeholders = HashMap::with_capacity(values.len());

                    for (i, (name, value)) in values.into_iter().enumerate() {
                        assignments.push(format!("#a{i} = :v{i}"));
                        names.insert(format!("#a{i}"), name.clone());
                        placeholders.insert(format!(":v{i}"), value.clone());
                    }

                    client
                        .update_item()
                        .table_name(&table_name)
                        .set_key(Some(key))
                        .update_expression(format!("SET {}", assignments.join(", ")))
                        .set_expression_attribute_names(Some(names))
                        .set_expression_attribute_values(Some(placeholders))
                        .send()
                        .await
                        .map_err(aws_sdk_dynamodb::Error::from)?;
                }
            }
        }

        debug!(table = %table_name, "Saved item");
        Ok(())
    }

    /// Fetch an item by key. Non-key attributes in `key` are ignored.
    #[instrument(skip(self, key))]
    pub async fn get(&self, table: &str, key: &Item) -> FlywheelResult<Option<Item>> {
        let spec = self.spec(table)?;
        let key = spec.key_of(key)?;

        let output = self
            .dynamo()?
            .client()
            .get_item()
            .table_name(self.table_name(table))
            .set_key(Some(key))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        Ok(output.item().cloned())
    }

    #[instrument(skip(self, key))]
    pub async fn delete(&self, table: &str, key: &Item) -> FlywheelResult<()> {
        let spec = self.spec(table)?;
        let key = spec.key_of(key)?;

        self.dynamo()?
            .client()
            .delete_item()
            .table_name(self.table_name(table))
            .set_key(Some(key))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        Ok(())
    }

    /// Read every item in the table, following pagination
    #[instrument(skip(self))]
    pub async fn scan(&self, table: &str) -> FlywheelResult<Vec<Item>> {
        self.spec(table)?;
        let table_name = self.table_name(table);
        let client = self.dynamo()?.client();

        let mut items = Vec::new();
        let mut start: Option<Item> = None;

        loop {
            let output = client
                .scan()
                .table_name(&table_name)
                .set_exclusive_start_key(start.take())
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;

            items.extend(output.items().iter().cloned());

            match output.last_evaluated_key() {
                Some(last) => start = Some(last.clone()),
                None => break,
            }
        }

        debug!(table = %table_name, count = items.len(), "Scanned table");
        Ok(items)
    }
}
