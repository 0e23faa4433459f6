use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{RowId, SheetStore, StoreError};

/// In-process stand-in for the remote sheet.
///
/// Deleted rows leave a tombstone so previously handed-out [`RowId`]s
/// keep pointing at the same row, matching the remote API's handles.
#[derive(Clone, Default)]
pub struct MemorySheet {
    rows: Arc<RwLock<Vec<Option<Vec<String>>>>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seeded(rows: Vec<Vec<String>>) -> Self {
        let sheet = Self::new();
        {
            let mut guard = sheet.rows.write().await;
            guard.extend(rows.into_iter().map(Some));
        }
        sheet
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn append_row(&self, fields: Vec<String>) -> Result<RowId, StoreError> {
        let mut guard = self.rows.write().await;
        guard.push(Some(fields));
        Ok(RowId(guard.len() as u32))
    }

    async fn find_row(&self, column: usize, value: &str) -> Result<Option<RowId>, StoreError> {
        let guard = self.rows.read().await;
        for (idx, row) in guard.iter().enumerate() {
            if let Some(fields) = row {
                if fields.get(column).map(String::as_str) == Some(value) {
                    return Ok(Some(RowId(idx as u32 + 1)));
                }
            }
        }
        Ok(None)
    }

    async fn read_row(&self, row: RowId) -> Result<Vec<String>, StoreError> {
        let guard = self.rows.read().await;
        (row.0 as usize)
            .checked_sub(1)
            .and_then(|idx| guard.get(idx))
            .and_then(|r| r.clone())
            .ok_or(StoreError::MissingRow(row))
    }

    async fn update_cell(
        &self,
        row: RowId,
        column: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut guard = self.rows.write().await;
        let idx = (row.0 as usize)
            .checked_sub(1)
            .ok_or(StoreError::MissingRow(row))?;
        let fields = guard
            .get_mut(idx)
            .and_then(|r| r.as_mut())
            .ok_or(StoreError::MissingRow(row))?;
        if column >= fields.len() {
            fields.resize(column + 1, String::new());
        }
        fields[column] = value.to_string();
        Ok(())
    }

    async fn delete_row(&self, row: RowId) -> Result<(), StoreError> {
        let mut guard = self.rows.write().await;
        let idx = (row.0 as usize)
            .checked_sub(1)
            .ok_or(StoreError::MissingRow(row))?;
        let slot = guard.get_mut(idx).ok_or(StoreError::MissingRow(row))?;
        if slot.take().is_none() {
            return Err(StoreError::MissingRow(row));
        }
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let guard = self.rows.read().await;
        Ok(guard.iter().filter_map(|r| r.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn append_preserves_insertion_order() {
        let sheet = MemorySheet::new();
        sheet.append_row(row(&["1", "a"])).await.unwrap();
        sheet.append_row(row(&["2", "b"])).await.unwrap();
        let all = sheet.read_all().await.unwrap();
        assert_eq!(all[0][0], "1");
        assert_eq!(all[1][0], "2");
        assert_eq!(sheet.row_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn row_ids_survive_deletes_of_other_rows() {
        let sheet = MemorySheet::new();
        sheet.append_row(row(&["1", "a"])).await.unwrap();
        let second = sheet.append_row(row(&["2", "b"])).await.unwrap();
        let third = sheet.append_row(row(&["3", "c"])).await.unwrap();

        sheet.delete_row(second).await.unwrap();

        assert_eq!(sheet.read_row(third).await.unwrap()[1], "c");
        assert_eq!(sheet.find_row(0, "3").await.unwrap(), Some(third));
        assert_eq!(sheet.row_count().await.unwrap(), 2);
        assert!(matches!(
            sheet.read_row(second).await,
            Err(StoreError::MissingRow(_))
        ));
    }

    #[tokio::test]
    async fn double_delete_reports_a_missing_row() {
        let sheet = MemorySheet::new();
        let id = sheet.append_row(row(&["1"])).await.unwrap();
        sheet.delete_row(id).await.unwrap();
        assert!(matches!(
            sheet.delete_row(id).await,
            Err(StoreError::MissingRow(_))
        ));
    }

    #[tokio::test]
    async fn update_cell_rewrites_in_place() {
        let sheet = MemorySheet::new();
        let id = sheet.append_row(row(&["1", "old"])).await.unwrap();
        sheet.update_cell(id, 1, "new").await.unwrap();
        assert_eq!(sheet.read_row(id).await.unwrap()[1], "new");
    }
}
