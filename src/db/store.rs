use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use super::models::{
    DailyMenu, Holiday, LastReset, MenuItem, Reservation, ReservationTimeWindow, Review,
    SalesRecord, User,
};
use crate::api::AppError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Un fichero JSON del directorio de datos, leído y reescrito entero
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lee el fichero completo
    ///
    /// Un fichero inexistente o vacío equivale al valor por defecto del tipo.
    /// Un JSON corrupto es un error: no se sustituye en silencio.
    pub async fn load(&self) -> Result<T> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(AppError::io(&format!("read {}", self.name()), e)),
        };

        if raw.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&raw).map_err(|source| {
            tracing::warn!(file = %self.name(), error = %source, "Unreadable data file");
            AppError::Json {
                file: self.name(),
                source,
            }
        })
    }

    /// Reescribe el fichero completo
    ///
    /// Se escribe a un fichero temporal hermano y se renombra encima, así un
    /// lector nunca ve un documento a medio escribir.
    pub async fn save(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(|source| AppError::Json {
            file: self.name(),
            source,
        })?;

        let tmp = self.path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| AppError::io(&format!("write {}", self.name()), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::io(&format!("replace {}", self.name()), e))?;

        tracing::debug!(file = %self.name(), "Data file rewritten");
        Ok(())
    }
}

/// Almacén de datos basado en ficheros JSON
///
/// Cada recurso vive en su propio fichero dentro de `root`. El candado de
/// escritura sólo serializa las secuencias leer-modificar-escribir dentro de
/// este proceso; varios procesos sobre el mismo directorio pueden pisarse.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub async fn init(root: impl Into<PathBuf>) -> Result<JsonStore> {
        let root = root.into();

        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::io(&format!("create data dir {}", root.display()), e))?;

        tracing::info!(data_dir = %root.display(), "JSON data store ready");

        Ok(JsonStore {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Toma el candado de escritura del proceso
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    fn file<T>(&self, name: &str) -> JsonFile<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        JsonFile::new(self.root.join(name))
    }

    pub fn holidays(&self) -> JsonFile<Vec<Holiday>> {
        self.file("holidays.json")
    }

    pub fn menu(&self) -> JsonFile<Vec<MenuItem>> {
        self.file("menu.json")
    }

    pub fn daily_menu(&self) -> JsonFile<Vec<DailyMenu>> {
        self.file("daily-menu.json")
    }

    pub fn reservations(&self) -> JsonFile<Vec<Reservation>> {
        self.file("reservations.json")
    }

    pub fn reservation_times(&self) -> JsonFile<Option<ReservationTimeWindow>> {
        self.file("reservation-times.json")
    }

    pub fn users(&self) -> JsonFile<Vec<User>> {
        self.file("users.json")
    }

    pub fn reviews(&self) -> JsonFile<Vec<Review>> {
        self.file("reviews.json")
    }

    pub fn sales(&self) -> JsonFile<Vec<SalesRecord>> {
        self.file("sales.json")
    }

    pub fn last_reset(&self) -> JsonFile<Option<LastReset>> {
        self.file("last-reset.json")
    }
}
