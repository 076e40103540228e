//! Fixed rubric templates instantiated by the pre-fill resolver. Labels are
//! the canonical Arabic rubric strings from the product.

use crate::model::{Criterion, CriterionGroup};

pub fn general_criteria_template() -> Vec<Criterion> {
    [
        ("gen-1", "تنفيذ الخطة الفصلية"),
        ("gen-2", "تحليل نتائج الاختبارات"),
        ("gen-3", "تنويع استراتيجيات التدريس"),
        ("gen-4", "توظيف الوسائل التعليمية"),
        ("gen-5", "متابعة الواجبات والتقويم المستمر"),
        ("gen-6", "إدارة الصف وضبط السلوك"),
        ("gen-7", "تفعيل مصادر التعلم"),
        ("gen-8", "التطوير المهني الذاتي"),
        ("gen-9", "التواصل مع أولياء الأمور"),
        ("gen-10", "المشاركة في الأنشطة المدرسية"),
    ]
    .iter()
    .map(|(id, label)| Criterion::new(id, label))
    .collect()
}

pub fn class_session_brief_template() -> Vec<CriterionGroup> {
    vec![
        group(
            "csg-planning",
            "التخطيط للدرس",
            &[
                ("cs-plan-1", "وضوح أهداف الدرس"),
                ("cs-plan-2", "ملاءمة الخطة لزمن الحصة"),
                ("cs-plan-3", "ربط الدرس بالخبرات السابقة"),
            ],
        ),
        group(
            "csg-delivery",
            "تنفيذ الدرس",
            &[
                ("cs-exec-1", "التمهيد المشوق للدرس"),
                ("cs-exec-2", "تنويع أساليب العرض"),
                ("cs-exec-3", "إشراك الطلاب في الأنشطة"),
                ("cs-exec-4", "توظيف التقنية في التدريس"),
            ],
        ),
        group(
            "csg-management",
            "إدارة الصف",
            &[
                ("cs-mgmt-1", "توزيع الوقت على مراحل الدرس"),
                ("cs-mgmt-2", "ضبط سلوك الطلاب"),
                ("cs-mgmt-3", "تهيئة بيئة صفية محفزة"),
            ],
        ),
        group(
            "csg-assessment",
            "التقويم",
            &[
                ("cs-assess-1", "تنويع أساليب التقويم"),
                ("cs-assess-2", "التغذية الراجعة الفورية"),
                ("cs-assess-3", "غلق الدرس وتلخيصه"),
            ],
        ),
    ]
}

fn group(id: &str, title: &str, items: &[(&str, &str)]) -> CriterionGroup {
    CriterionGroup {
        id: id.to_string(),
        title: title.to_string(),
        criteria: items
            .iter()
            .map(|(cid, label)| Criterion::new(cid, label))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_start_unscored() {
        assert!(general_criteria_template().iter().all(|c| c.score == 0));
        assert!(class_session_brief_template()
            .iter()
            .flat_map(|g| g.criteria.iter())
            .all(|c| c.score == 0));
    }

    #[test]
    fn template_ids_are_unique() {
        let mut ids: Vec<String> = general_criteria_template()
            .into_iter()
            .map(|c| c.id)
            .collect();
        for g in class_session_brief_template() {
            ids.push(g.id.clone());
            ids.extend(g.criteria.into_iter().map(|c| c.id));
        }
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
