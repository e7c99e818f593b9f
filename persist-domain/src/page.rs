//! 分页结果（PagedResult）
//!
//! 携带重建页边界所需的全部元数据；越界页索引返回空条目而非错误。
//!
/// 一次窗口化查询的结果
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    items: Vec<T>,
    total_count: u64,
    page_index: u64,
    page_size: u64,
}

impl<T> PagedResult<T> {
    pub(crate) fn new(items: Vec<T>, total_count: u64, page_index: u64, page_size: u64) -> Self {
        Self {
            items,
            total_count,
            page_index,
            page_size,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn page_index(&self) -> u64 {
        self.page_index
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// 总页数（向上取整）
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(self.page_size.max(1))
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index + 1 < self.total_pages()
    }
}
