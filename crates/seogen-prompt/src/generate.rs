use std::collections::BTreeMap;

use thiserror::Error;

use seogen_core::catalog;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("generation topic is empty")]
    EmptyTopic,
    #[error("no fields selected for generation")]
    NoFields,
}

/// Canned copy for one catalog field. `None` for ids without a template.
pub fn generate_field(field_id: &str, topic: &str) -> Option<String> {
    let lower = topic.to_lowercase();
    let text = match field_id {
        "h1" => format!("{topic} — купить в интернет-магазине с доставкой"),
        "title" => format!("{topic} | Каталог, цены, отзывы | Интернет-магазин"),
        "description" => format!(
            "{topic} в наличии. Широкий выбор, доставка по России, гарантия качества. \
Сравните цены и характеристики. Закажите онлайн!"
        ),
        "keywords" => format!("{lower}, купить {lower}, {lower} цена, {lower} заказать"),
        "product_desc" => format!(
            "Представляем {topic} — продукт, который сочетает в себе высокое качество и современные технологии. \
Этот товар идеально подходит для тех, кто ценит надёжность и функциональность.\n\n\
Основные характеристики:\n\
• Высокое качество изготовления\n\
• Современный дизайн\n\
• Оптимальное соотношение цены и качества\n\
• Гарантия производителя\n\n\
Преимущества:\n\
Наш {topic} отличается долговечностью и удобством использования. Продукт прошёл все необходимые \
проверки качества и полностью соответствует российским стандартам.\n\n\
Применение:\n\
Идеально подходит для повседневного использования. Простота эксплуатации и надёжность делают этот \
товар отличным выбором для любого покупателя."
        ),
        "category_desc" => format!(
            "В категории {topic} представлен широкий ассортимент качественных товаров от проверенных производителей. \
Мы тщательно отбираем каждый продукт, чтобы предложить вам лучшее соотношение цены и качества.\n\n\
В нашем каталоге вы найдёте товары на любой вкус и бюджет. Все позиции имеют подробные описания, \
фотографии и реальные отзывы покупателей. Оформите заказ онлайн с доставкой по всей России!"
        ),
        "short_desc" => format!(
            "{topic} высокого качества. В наличии, быстрая доставка, гарантия. \
Широкий выбор моделей по выгодным ценам."
        ),
        "blog_post" => format!(
            "# Всё, что нужно знать о {topic}\n\n\
Выбор правильного товара — важное решение. В этой статье мы расскажем, на что обратить внимание \
при покупке и как выбрать оптимальный вариант.\n\n\
## Основные критерии выбора\n\n\
1. Качество изготовления\n\
2. Функциональные характеристики\n\
3. Цена и гарантийные условия\n\
4. Отзывы других покупателей\n\n\
## Актуальные тренды 2026 года\n\n\
Современный рынок предлагает широкий выбор решений. Покупатели все чаще обращают внимание на \
экологичность, надёжность и технологичность продуктов.\n\n\
## Как выбрать {topic}\n\n\
При выборе рекомендуем учитывать ваши конкретные потребности и бюджет. Наши эксперты всегда готовы \
помочь с подбором оптимального варианта.\n\n\
## Заключение\n\n\
Правильный выбор {topic} обеспечит вам комфорт и удовлетворение от покупки. Заказывайте в нашем \
магазине — гарантируем качество и выгодные цены!"
        ),
        "news" => format!(
            "Новое поступление: {topic} теперь в наличии!\n\n\
Рады сообщить, что в нашем каталоге появились новинки в категории {topic}. Расширенный ассортимент, \
актуальные модели и выгодные цены.\n\n\
Успейте оформить заказ с дополнительной скидкой 10% для первых покупателей. Акция действует до \
конца месяца. Доставка по всей России!"
        ),
        "tags" => format!("{lower}, купить онлайн, доставка, качество, выгодная цена"),
        _ => return None,
    };
    Some(text)
}

/// Generate copy for every selected field. Ids missing from the catalog are
/// skipped.
pub fn generate<S: AsRef<str>>(
    topic: &str,
    field_ids: &[S],
) -> Result<BTreeMap<String, String>, GenerateError> {
    if topic.trim().is_empty() {
        return Err(GenerateError::EmptyTopic);
    }
    if field_ids.is_empty() {
        return Err(GenerateError::NoFields);
    }

    let results: BTreeMap<String, String> = field_ids
        .iter()
        .map(|id| id.as_ref())
        .filter(|id| catalog::find_field_type(id).is_some())
        .filter_map(|id| generate_field(id, topic).map(|text| (id.to_string(), text)))
        .collect();
    tracing::debug!(topic, fields = results.len(), "generated copy");
    Ok(results)
}
