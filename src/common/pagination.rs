// src/common/pagination.rs
//
// Paginação estilo "infinite scroll": página 1-based, has_next calculado
// a partir do total, next_page presente só quando há mais resultados.

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: u32 = 25;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageParams {
    pub page: u32,
    pub per_page: u32,
}

impl PageParams {
    /// Normaliza os parâmetros vindos da query string:
    /// página mínima 1, per_page entre 1 e MAX com default 25.
    pub fn normalize(page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_number: u32,
    pub has_next: bool,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// Monta a página a partir da fatia retornada pelo banco e do total.
    pub fn build(items: Vec<T>, total_count: i64, params: &PageParams) -> Self {
        let has_next = params.offset() + (items.len() as i64) < total_count;
        Self {
            items,
            total_count,
            page_number: params.page,
            has_next,
            next_page: has_next.then(|| params.page + 1),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            has_next: self.has_next,
            next_page: self.next_page,
        }
    }
}
