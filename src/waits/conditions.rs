//! Canonical readiness queries.
//!
//! Each function returns a [`Condition`] that re-resolves its locator on every
//! evaluation, so a re-render between two polls only costs one "not yet".
//!
//! | Query | Satisfied when | Value |
//! |-------|----------------|-------|
//! | [`presence_of`] | at least one node matches | first match |
//! | [`visibility_of`] | first match is displayed with a non-zero box | that element |
//! | [`invisibility_of`] | nothing matches, or first match is hidden or detached | `true` |
//! | [`clickability_of`] | first match is visible and enabled | that element |
//! | [`count_more_than`] | more than `n` nodes match | `true` |
//! | [`all_visible`] | at least one node matches and every match is visible | all matches |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::browser::{By, Element, Session, script};
use crate::error::{Error, Result};
use crate::identifiers::WindowHandle;

use super::condition::{Condition, boxed_probe};

// ============================================================================
// Helpers
// ============================================================================

/// Collapses runs of whitespace and trims the ends.
pub(crate) fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn first_match(session: &Arc<dyn Session>, by: &By) -> Result<Option<Element>> {
    Ok(session
        .find_elements(by)
        .await?
        .into_iter()
        .next()
        .map(|id| Element::new(id, Arc::clone(session))))
}

async fn all_matches(session: &Arc<dyn Session>, by: &By) -> Result<Vec<Element>> {
    Ok(session
        .find_elements(by)
        .await?
        .into_iter()
        .map(|id| Element::new(id, Arc::clone(session)))
        .collect())
}

async fn is_clickable(element: &Element) -> Result<bool> {
    Ok(element.is_visible().await? && element.is_enabled().await?)
}

/// Maps "the node is gone" to `true` for the invisibility queries.
async fn is_gone_or_hidden(element: &Element) -> Result<bool> {
    match element.is_visible().await {
        Ok(visible) => Ok(!visible),
        Err(Error::StaleElement { .. }) => Ok(true),
        Err(e) => Err(e),
    }
}

// ============================================================================
// Element Readiness
// ============================================================================

/// At least one node matches `by`, visible or not.
pub fn presence_of(by: &By) -> Condition<Element> {
    let by = by.clone();
    Condition::new(format!("presence of {by}"), move |session| {
        let by = by.clone();
        boxed_probe(async move { first_match(&session, &by).await })
    })
}

/// The first node matching `by` is displayed with a non-zero box.
pub fn visibility_of(by: &By) -> Condition<Element> {
    let by = by.clone();
    Condition::new(format!("visibility of {by}"), move |session| {
        let by = by.clone();
        boxed_probe(async move {
            let Some(element) = first_match(&session, &by).await? else {
                return Ok(None);
            };
            Ok(element.is_visible().await?.then_some(element))
        })
    })
}

/// An already resolved element is displayed with a non-zero box.
pub fn visibility_of_element(element: &Element) -> Condition<Element> {
    let element = element.clone();
    Condition::new(format!("visibility of element {}", element.id()), move |_| {
        let element = element.clone();
        boxed_probe(async move { Ok(element.is_visible().await?.then_some(element)) })
    })
}

/// Nothing matches `by`, or the first match is hidden or detached.
pub fn invisibility_of(by: &By) -> Condition<bool> {
    let by = by.clone();
    Condition::new(format!("invisibility of {by}"), move |session| {
        let by = by.clone();
        boxed_probe(async move {
            match first_match(&session, &by).await? {
                None => Ok(Some(true)),
                Some(element) => Ok(is_gone_or_hidden(&element).await?.then_some(true)),
            }
        })
    })
}

/// An already resolved element is hidden or detached.
pub fn invisibility_of_element(element: &Element) -> Condition<bool> {
    let element = element.clone();
    Condition::new(format!("invisibility of element {}", element.id()), move |_| {
        let element = element.clone();
        boxed_probe(async move { Ok(is_gone_or_hidden(&element).await?.then_some(true)) })
    })
}

/// The first node matching `by` is visible and enabled.
pub fn clickability_of(by: &By) -> Condition<Element> {
    let by = by.clone();
    Condition::new(format!("clickability of {by}"), move |session| {
        let by = by.clone();
        boxed_probe(async move {
            let Some(element) = first_match(&session, &by).await? else {
                return Ok(None);
            };
            Ok(is_clickable(&element).await?.then_some(element))
        })
    })
}

/// An already resolved element is visible and enabled.
pub fn clickability_of_element(element: &Element) -> Condition<Element> {
    let element = element.clone();
    Condition::new(format!("clickability of element {}", element.id()), move |_| {
        let element = element.clone();
        boxed_probe(async move { Ok(is_clickable(&element).await?.then_some(element)) })
    })
}

/// More than `count` nodes match `by`.
pub fn count_more_than(by: &By, count: usize) -> Condition<bool> {
    let by = by.clone();
    Condition::new(format!("more than {count} matches of {by}"), move |session| {
        let by = by.clone();
        boxed_probe(async move {
            let found = session.find_elements(&by).await?.len();
            Ok((found > count).then_some(true))
        })
    })
}

/// At least one node matches `by` and every match is visible.
pub fn all_visible(by: &By) -> Condition<Vec<Element>> {
    let by = by.clone();
    Condition::new(format!("visibility of all {by}"), move |session| {
        let by = by.clone();
        boxed_probe(async move {
            let elements = all_matches(&session, &by).await?;
            if elements.is_empty() {
                return Ok(None);
            }
            for element in &elements {
                if !element.is_visible().await? {
                    return Ok(None);
                }
            }
            Ok(Some(elements))
        })
    })
}

// ============================================================================
// Scoped Readiness
// ============================================================================

/// The first descendant of `container` matching `by` is visible.
pub fn visibility_within(container: &Element, by: &By) -> Condition<Element> {
    let container = container.clone();
    let by = by.clone();
    Condition::new(
        format!("visibility of {by} within {}", container.id()),
        move |_| {
            let container = container.clone();
            let by = by.clone();
            boxed_probe(async move {
                let Some(element) = container.find_elements(&by).await?.into_iter().next() else {
                    return Ok(None);
                };
                Ok(element.is_visible().await?.then_some(element))
            })
        },
    )
}

/// The first descendant of `container` matching `by` is visible and enabled.
pub fn clickability_within(container: &Element, by: &By) -> Condition<Element> {
    let container = container.clone();
    let by = by.clone();
    Condition::new(
        format!("clickability of {by} within {}", container.id()),
        move |_| {
            let container = container.clone();
            let by = by.clone();
            boxed_probe(async move {
                let Some(element) = container.find_elements(&by).await?.into_iter().next() else {
                    return Ok(None);
                };
                Ok(is_clickable(&element).await?.then_some(element))
            })
        },
    )
}

// ============================================================================
// Content Readiness
// ============================================================================

/// At least one match of `by` is visible and every visible match has trimmed
/// text longer than `min_len` characters.
///
/// Used to tell rendered list items apart from skeleton placeholders.
pub fn visible_text_longer_than(by: &By, min_len: usize) -> Condition<Vec<Element>> {
    let by = by.clone();
    Condition::new(
        format!("visible {by} with text longer than {min_len}"),
        move |session| {
            let by = by.clone();
            boxed_probe(async move {
                let mut visible = Vec::new();
                for element in all_matches(&session, &by).await? {
                    if element.is_visible().await? {
                        visible.push(element);
                    }
                }
                if visible.is_empty() {
                    return Ok(None);
                }
                for element in &visible {
                    if element.text().await?.trim().chars().count() <= min_len {
                        return Ok(None);
                    }
                }
                Ok(Some(visible))
            })
        },
    )
}

/// The native select matched by `select` offers an `<option>` whose
/// normalized text equals `text`.
///
/// The select itself is resolved again on every evaluation, since option
/// lists are often filled by replacing the whole control.
pub fn option_in(select: &By, text: &str) -> Condition<Element> {
    let select = select.clone();
    let wanted = normalize_text(text);
    Condition::new(format!("option '{wanted}' in {select}"), move |session| {
        let select = select.clone();
        let wanted = wanted.clone();
        boxed_probe(async move {
            let Some(control) = first_match(&session, &select).await? else {
                return Ok(None);
            };
            for option in control.find_elements(&By::tag("option")).await? {
                if normalize_text(&option.text().await?) == wanted {
                    return Ok(Some(option));
                }
            }
            Ok(None)
        })
    })
}

/// A visible match of `options` whose normalized text equals `text`, or
/// failing that, contains it.
pub fn popup_option(options: &By, text: &str) -> Condition<Element> {
    let options = options.clone();
    let wanted = normalize_text(text);
    Condition::new(format!("popup option '{wanted}' in {options}"), move |session| {
        let options = options.clone();
        let wanted = wanted.clone();
        boxed_probe(async move {
            let mut partial = None;
            for element in all_matches(&session, &options).await? {
                if !element.is_visible().await? {
                    continue;
                }
                let label = normalize_text(&element.text().await?);
                if label == wanted {
                    return Ok(Some(element));
                }
                if partial.is_none() && label.contains(&wanted) {
                    partial = Some(element);
                }
            }
            Ok(partial)
        })
    })
}

// ============================================================================
// Page Readiness
// ============================================================================

/// The current URL contains `fragment`; yields the URL.
pub fn url_contains(fragment: &str) -> Condition<String> {
    let fragment = fragment.to_string();
    Condition::new(format!("url containing '{fragment}'"), move |session| {
        let fragment = fragment.clone();
        boxed_probe(async move {
            let url = session.current_url().await?;
            Ok(url.contains(&fragment).then_some(url))
        })
    })
}

/// `document.readyState` is `complete`.
pub fn document_ready() -> Condition<()> {
    Condition::new("document ready", |session| {
        boxed_probe(async move {
            let state = session.execute_script(script::READY_STATE, vec![]).await?;
            Ok((state.as_str() == Some("complete")).then_some(()))
        })
    })
}

/// A window other than `original` is open; yields its handle.
pub fn window_other_than(original: &WindowHandle) -> Condition<WindowHandle> {
    let original = original.clone();
    Condition::new(format!("window other than {original}"), move |session| {
        let original = original.clone();
        boxed_probe(async move {
            Ok(session
                .window_handles()
                .await?
                .into_iter()
                .find(|handle| *handle != original))
        })
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Rect;
    use crate::mock::{FakeNode, FakeSession};

    const URL: &str = "https://example.test/";

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Istanbul,\n  Turkiye "), "Istanbul, Turkiye");
        assert_eq!(normalize_text(""), "");
    }

    #[tokio::test]
    async fn test_presence_ignores_visibility() {
        let fake = FakeSession::new(URL);
        let id = fake.with_page(|page| page.add(By::css("#hidden"), FakeNode::new("div").hidden()));

        let found = presence_of(&By::css("#hidden")).evaluate(fake.clone()).await.unwrap();
        assert_eq!(found.map(|e| e.id().clone()), Some(id));

        let visible = visibility_of(&By::css("#hidden")).evaluate(fake).await.unwrap();
        assert!(visible.is_none());
    }

    #[tokio::test]
    async fn test_visibility_requires_area() {
        let fake = FakeSession::new(URL);
        fake.with_page(|page| {
            page.add(By::css("h1"), FakeNode::new("h1").rect(Rect::new(0.0, 0.0, 0.0, 0.0)))
        });

        let result = visibility_of(&By::css("h1")).evaluate(fake).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_invisibility_when_absent_or_detached() {
        let fake = FakeSession::new(URL);
        assert_eq!(
            invisibility_of(&By::css(".spinner")).evaluate(fake.clone()).await.unwrap(),
            Some(true)
        );

        let id = fake.with_page(|page| page.add(By::css(".spinner"), FakeNode::new("div")));
        assert_eq!(
            invisibility_of(&By::css(".spinner")).evaluate(fake.clone()).await.unwrap(),
            None
        );

        let spinner = Element::new(id.clone(), fake.clone());
        fake.with_page(|page| page.remove(&id));
        assert_eq!(
            invisibility_of_element(&spinner).evaluate(fake).await.unwrap(),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_clickability_requires_enabled() {
        let fake = FakeSession::new(URL);
        let id = fake.with_page(|page| page.add(By::css("#apply"), FakeNode::new("button").disabled()));

        let cond = clickability_of(&By::css("#apply"));
        assert!(cond.evaluate(fake.clone()).await.unwrap().is_none());

        fake.with_page(|page| page.node_mut(&id).unwrap().enabled = true);
        assert!(cond.evaluate(fake).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_count_more_than() {
        let fake = FakeSession::new(URL);
        let cond = count_more_than(&By::css(".job"), 0);
        assert_eq!(cond.evaluate(fake.clone()).await.unwrap(), None);

        fake.with_page(|page| page.add(By::css(".job"), FakeNode::new("div")));
        assert_eq!(cond.evaluate(fake).await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_all_visible_rejects_empty_and_partial() {
        let fake = FakeSession::new(URL);
        let cond = all_visible(&By::css(".job"));
        assert!(cond.evaluate(fake.clone()).await.unwrap().is_none());

        fake.with_page(|page| {
            page.add(By::css(".job"), FakeNode::new("div"));
            page.add(By::css(".job"), FakeNode::new("div").hidden());
        });
        assert!(cond.evaluate(fake).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_visible_text_longer_than_skips_hidden() {
        let fake = FakeSession::new(URL);
        fake.with_page(|page| {
            page.add(By::css(".job"), FakeNode::new("div").text("Senior QA Engineer"));
            page.add(By::css(".job"), FakeNode::new("div").text("").hidden());
        });

        let cards = visible_text_longer_than(&By::css(".job"), 10)
            .evaluate(fake.clone())
            .await
            .unwrap();
        assert_eq!(cards.map(|c| c.len()), Some(1));

        fake.with_page(|page| page.add(By::css(".job"), FakeNode::new("div").text("Loading")));
        let pending = visible_text_longer_than(&By::css(".job"), 10).evaluate(fake).await.unwrap();
        assert!(pending.is_none());
    }

    #[tokio::test]
    async fn test_option_in_matches_normalized_text() {
        let fake = FakeSession::new(URL);
        let wanted = fake.with_page(|page| {
            let select = page.add(By::id("filter-by-location"), FakeNode::new("select"));
            page.add_child(&select, By::tag("option"), FakeNode::new("option").text("All"));
            page.add_child(
                &select,
                By::tag("option"),
                FakeNode::new("option").text(" Istanbul,  Turkiye "),
            )
        });

        let option = option_in(&By::id("filter-by-location"), "Istanbul, Turkiye")
            .evaluate(fake.clone())
            .await
            .unwrap();
        assert_eq!(option.map(|o| o.id().clone()), Some(wanted));

        let missing = option_in(&By::id("filter-by-location"), "Ankara, Turkiye")
            .evaluate(fake)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_popup_option_prefers_exact_match() {
        let fake = FakeSession::new(URL);
        let exact = fake.with_page(|page| {
            page.add(By::css("li"), FakeNode::new("li").text("Quality Assurance Lead"));
            page.add(By::css("li"), FakeNode::new("li").text("Quality Assurance"))
        });

        let found = popup_option(&By::css("li"), "Quality Assurance")
            .evaluate(fake)
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.id().clone()), Some(exact));
    }

    #[tokio::test]
    async fn test_popup_option_falls_back_to_contains() {
        let fake = FakeSession::new(URL);
        let partial = fake.with_page(|page| {
            page.add(By::css("li"), FakeNode::new("li").text("Engineering"));
            page.add(By::css("li"), FakeNode::new("li").text("Quality Assurance (12)"))
        });

        let found = popup_option(&By::css("li"), "Quality Assurance")
            .evaluate(fake)
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.id().clone()), Some(partial));
    }

    #[tokio::test]
    async fn test_url_contains_and_window_other_than() {
        let fake = FakeSession::new("https://jobs.lever.co/acme/123");
        let url = url_contains("lever").evaluate(fake.clone()).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://jobs.lever.co/acme/123"));

        let original = fake.current_window().await.unwrap();
        assert!(window_other_than(&original).evaluate(fake.clone()).await.unwrap().is_none());

        let popup = fake.open_window("https://jobs.lever.co/acme/123/apply");
        assert_eq!(
            window_other_than(&original).evaluate(fake).await.unwrap(),
            Some(popup)
        );
    }

    #[tokio::test]
    async fn test_document_ready() {
        let fake = FakeSession::new(URL);
        fake.set_ready_state("loading");
        assert!(document_ready().evaluate(fake.clone()).await.unwrap().is_none());

        fake.set_ready_state("complete");
        assert!(document_ready().evaluate(fake).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clickability_within_scopes_to_container() {
        let fake = FakeSession::new(URL);
        let (banner, inner) = fake.with_page(|page| {
            page.add(By::css("button"), FakeNode::new("button").text("Outside"));
            let banner = page.add(By::css(".cookie"), FakeNode::new("div"));
            let inner = page.add_child(&banner, By::css("button"), FakeNode::new("button"));
            (banner, inner)
        });
        let banner = Element::new(banner, fake.clone());

        let found = clickability_within(&banner, &By::css("button"))
            .evaluate(fake)
            .await
            .unwrap();
        assert_eq!(found.map(|e| e.id().clone()), Some(inner));
    }
}
