//! Static dashboard catalog: OpenCart field types, the default generation
//! prompts and the knowledge sources the actualization feed follows.

use serde::Serialize;

/// A catalog field that copy can be generated for.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    pub id: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub char_limit: u32,
}

/// A generation prompt template with `{variable}` placeholders.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: &'static str,
    pub field_type: &'static str,
    pub template: &'static str,
    /// Display weight of free AI output versus strict variables, 0-100.
    pub ai_balance: u8,
    pub variables: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Active,
    Pending,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct KnowledgeSource {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub category: &'static str,
    pub status: SourceStatus,
}

pub const FIELD_TYPES: &[FieldType] = &[
    FieldType { id: "h1", label: "H1 заголовок", category: "Заголовки", char_limit: 65 },
    FieldType { id: "title", label: "Title (meta)", category: "Meta теги", char_limit: 60 },
    FieldType { id: "description", label: "Meta Description", category: "Meta теги", char_limit: 160 },
    FieldType { id: "keywords", label: "Meta Keywords", category: "Meta теги", char_limit: 200 },
    FieldType { id: "product_desc", label: "Описание товара", category: "Описания", char_limit: 1500 },
    FieldType { id: "category_desc", label: "Описание категории", category: "Описания", char_limit: 1200 },
    FieldType { id: "short_desc", label: "Краткое описание", category: "Описания", char_limit: 300 },
    FieldType { id: "blog_post", label: "Статья блога", category: "Контент", char_limit: 5000 },
    FieldType { id: "news", label: "Новость", category: "Контент", char_limit: 800 },
    FieldType { id: "tags", label: "Теги", category: "Структура", char_limit: 100 },
];

pub const PROMPTS: &[Prompt] = &[
    Prompt {
        id: "h1",
        field_type: "H1 заголовок",
        template: "Создай SEO-оптимизированный H1 для товара {product_name} в категории {category}. \
Учитывай поисковые запросы Яндекса и включи ключевые слова естественным образом. Длина: до 65 символов.",
        ai_balance: 70,
        variables: &["{product_name}", "{category}", "{brand}"],
    },
    Prompt {
        id: "description",
        field_type: "Meta Description",
        template: "Напиши привлекательное meta description для {product_name}. \
Включи УТП, призыв к действию и ключевые запросы под Яндекс. Длина: 150-160 символов.",
        ai_balance: 80,
        variables: &["{product_name}", "{price}", "{category}"],
    },
    Prompt {
        id: "product_desc",
        field_type: "Описание товара",
        template: "Создай подробное описание товара {product_name} бренда {brand}. \
Структура: введение, характеристики, преимущества, применение. Оптимизируй под запросы Яндекс.Маркет. \
Длина: 1000-1500 символов.",
        ai_balance: 90,
        variables: &["{product_name}", "{brand}", "{category}", "{specs}"],
    },
];

pub const KNOWLEDGE_SOURCES: &[KnowledgeSource] = &[
    KnowledgeSource {
        id: "1",
        name: "Справка Яндекс.Вебмастер",
        url: "https://yandex.ru/support/webmaster/",
        category: "Официальные гайды",
        status: SourceStatus::Active,
    },
    KnowledgeSource {
        id: "2",
        name: "SearchEngines.ru — Новости",
        url: "https://www.searchengines.ru/",
        category: "Новости SEO",
        status: SourceStatus::Active,
    },
    KnowledgeSource {
        id: "3",
        name: "VC.ru — #SEO",
        url: "https://vc.ru/tag/seo",
        category: "Кейсы и аналитика",
        status: SourceStatus::Active,
    },
    KnowledgeSource {
        id: "4",
        name: "Блог Яндекс.Маркет",
        url: "https://market.yandex.ru/blog",
        category: "E-commerce",
        status: SourceStatus::Active,
    },
    KnowledgeSource {
        id: "5",
        name: "SEO Community Telegram",
        url: "t.me/seo_community",
        category: "Комьюнити",
        status: SourceStatus::Active,
    },
    KnowledgeSource {
        id: "6",
        name: "Habr — SEO",
        url: "https://habr.com/ru/flows/seo/",
        category: "Техническое SEO",
        status: SourceStatus::Pending,
    },
];

pub fn find_field_type(id: &str) -> Option<&'static FieldType> {
    FIELD_TYPES.iter().find(|f| f.id == id)
}

pub fn find_prompt(id: &str) -> Option<&'static Prompt> {
    PROMPTS.iter().find(|p| p.id == id)
}
