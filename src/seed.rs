use crate::model::{Course, Student};

/// Students written by the "initialize" action.
pub const DEFAULT_STUDENTS: &[(&str, &str)] = &[
    ("张三", "计算机2101"),
    ("李四", "计算机2101"),
    ("王五", "计算机2102"),
];

/// Courses written by the "initialize" action: (name, credit, week range).
pub const DEFAULT_COURSES: &[(&str, f64, &str)] = &[
    ("高等数学", 4.0, "3-16"),
    ("线性代数", 3.0, "3-14"),
    ("大学物理", 4.0, "6-15"),
    ("Python编程技术", 2.5, "3-16"),
    ("思想道德与法治", 3.5, "9-14"),
];

/// Course names offered when adding a course.
pub const COURSE_CATALOG: &[&str] = &[
    "高等数学",
    "线性代数",
    "大学物理",
    "大学物理实验",
    "工程数学",
    "概率论与数理统计",
    "工程导论",
    "c语言编程与实践",
    "电路分析基础",
    "工程实践",
    "金工实习",
    "工程制图",
    "模拟电子技术",
    "运筹学",
    "数字电路与逻辑设计",
    "信号与系统",
    "自动控制原理",
    "电子系统设计与实现",
    "微处理器与微计算机系统",
    "传感器与检测技术",
    "现代控制理论",
    "面向对象程序设计(C++)",
    "机械学基础",
    "机器人操作系统基础",
    "机器人系统软件设计",
    "机器人学基础",
    "人工智能",
    "机器人设计与实现",
    "Python编程技术",
    "系统仿真编程技术",
    "嵌入式系统原理与设计",
    "图像处理与机器视觉",
    "模式识别与机器学习",
    "无人驾驶技术",
    "三维建模及仿真",
    "机器人控制元件与控制系",
    "移动机器人定位与导航",
    "思想道德与法治",
    "中国近现代史纲要",
    "形势与政策",
    "马克思主义基本原理",
    "毛泽东思想和中国特色社会",
    "义理论体系概论",
    "习近平新时代中国特色社会主义思想概论",
    "大学英语",
    "创新创业教育基础",
    "TRIZ创新方法",
    "创业培训",
    "创新、发明与知识产权实践",
];

pub fn default_students() -> Vec<Student> {
    DEFAULT_STUDENTS
        .iter()
        .map(|(name, class_name)| Student {
            name: name.to_string(),
            class_name: class_name.to_string(),
        })
        .collect()
}

pub fn default_courses() -> Vec<Course> {
    DEFAULT_COURSES
        .iter()
        .map(|(name, credit, week_range)| Course {
            name: name.to_string(),
            credit: *credit,
            week_range: week_range.to_string(),
        })
        .collect()
}
